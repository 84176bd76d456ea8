use crate::domain::order::Order;
use crate::error::Result;
use std::io::Write;

/// Writes the final state of replayed orders as CSV, one row per symbolic
/// order reference.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_orders<'a, I>(&mut self, orders: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a Order)>,
    {
        self.writer.write_record([
            "order",
            "status",
            "payment_method",
            "payment_status",
            "total",
        ])?;
        for (reference, order) in orders {
            self.writer.write_record([
                reference,
                order.status.as_str(),
                order.payment_method.as_str(),
                order.payment_status.as_str(),
                &order.total_amount.normalize().to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
