use clap::Parser;
use mealflow::application::engine::{OrderEngine, OrderLine, PlaceOrderRequest};
use mealflow::domain::identity::Identity;
use mealflow::domain::order::{Order, OrderId, OperatorId, OrderStatus, PaymentMethod};
use mealflow::domain::ports::OrderStoreBox;
use mealflow::error::{OrderError, Result as CoreResult};
use mealflow::infrastructure::in_memory::{
    InMemoryCatalog, InMemoryOperatorDirectory, InMemoryOrderStore,
};
use mealflow::interfaces::csv::order_writer::OrderWriter;
use mealflow::interfaces::csv::script_reader::{
    CommandKind, ScriptCommand, ScriptReader, parse_actor, parse_items,
};
use mealflow::interfaces::csv::seed_reader;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Operator directory CSV (id, restaurant)
    operators: PathBuf,

    /// Menu catalog CSV (id, operator, name, price, image)
    menu: PathBuf,

    /// Order command script CSV to replay
    script: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(cli: &Cli) -> Result<OrderStoreBox> {
    use mealflow::infrastructure::rocksdb::RocksDbOrderStore;

    Ok(match &cli.db_path {
        Some(path) => Box::new(RocksDbOrderStore::open(path).into_diagnostic()?),
        None => Box::new(InMemoryOrderStore::new()),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(_cli: &Cli) -> Result<OrderStoreBox> {
    Ok(Box::new(InMemoryOrderStore::new()))
}

/// A symbolic order reference bound by a `place` command: the created order
/// and the customer who owns it.
struct Binding {
    order_id: OrderId,
    owner: Identity,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let operators = InMemoryOperatorDirectory::new();
    let file = File::open(&cli.operators).into_diagnostic()?;
    for record in seed_reader::read_operators(file).into_diagnostic()? {
        let (id, profile) = record.into_entry();
        operators.insert(id, profile);
    }

    let catalog = InMemoryCatalog::new();
    let file = File::open(&cli.menu).into_diagnostic()?;
    for record in seed_reader::read_menu(file).into_diagnostic()? {
        let (id, item) = record.into_entry().into_diagnostic()?;
        catalog.insert(id, item);
    }

    let engine = OrderEngine::new(open_store(&cli)?, Box::new(catalog), Box::new(operators));

    let mut bindings: HashMap<String, Binding> = HashMap::new();
    let mut sequence: Vec<String> = Vec::new();

    let file = File::open(&cli.script).into_diagnostic()?;
    for command in ScriptReader::new(file).commands() {
        match command {
            Ok(command) => {
                let reference = command.order.clone();
                if let Err(e) = apply(&engine, &mut bindings, &mut sequence, command).await {
                    eprintln!("Error applying command for '{reference}': {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {e}");
            }
        }
    }

    // Final state of every placed order, in placement order.
    let mut rows: Vec<(String, Order)> = Vec::new();
    for reference in &sequence {
        if let Some(binding) = bindings.get(reference) {
            let order = fetch(&engine, binding).await.into_diagnostic()?;
            rows.push((reference.clone(), order));
        }
    }

    let stdout = io::stdout();
    let mut writer = OrderWriter::new(stdout.lock());
    writer
        .write_orders(rows.iter().map(|(reference, order)| (reference.as_str(), order)))
        .into_diagnostic()?;

    Ok(())
}

async fn apply(
    engine: &OrderEngine,
    bindings: &mut HashMap<String, Binding>,
    sequence: &mut Vec<String>,
    command: ScriptCommand,
) -> CoreResult<()> {
    let identity = parse_actor(&command.actor)?;

    if command.command == CommandKind::Place {
        let arg = command.arg.as_deref().ok_or_else(|| {
            OrderError::Validation("place requires an operator id".to_string())
        })?;
        // `op1` defaults to COD; `op1:upi` selects the payment method.
        let (operator_id, payment_method) = match arg.split_once(':') {
            Some((op, method)) => (op, method.parse::<PaymentMethod>()?),
            None => (arg, PaymentMethod::Cod),
        };
        let items: Vec<OrderLine> = parse_items(command.detail.as_deref().unwrap_or(""))?;

        let order = engine
            .place_order(
                &identity,
                PlaceOrderRequest {
                    operator_id: OperatorId::new(operator_id),
                    items,
                    payment_method,
                },
            )
            .await?;

        bindings.insert(
            command.order.clone(),
            Binding {
                order_id: order.id,
                owner: identity,
            },
        );
        sequence.push(command.order);
        return Ok(());
    }

    let binding = bindings.get(&command.order).ok_or_else(|| {
        OrderError::Validation(format!("Unknown order reference '{}'", command.order))
    })?;

    match command.command {
        CommandKind::Place => unreachable!("handled above"),
        CommandKind::Pay => {
            engine
                .confirm_upi_payment(&identity, &binding.order_id)
                .await?;
        }
        CommandKind::Status => {
            let target: OrderStatus = command
                .arg
                .as_deref()
                .ok_or_else(|| {
                    OrderError::Validation("status requires a target status".to_string())
                })?
                .parse()?;
            engine
                .transition(&identity, &binding.order_id, target, command.detail.as_deref())
                .await?;
        }
        CommandKind::Cancel => {
            engine
                .request_cancellation(&identity, &binding.order_id, command.arg.as_deref())
                .await?;
        }
        CommandKind::Deliver => {
            let code = match command.arg {
                Some(code) => code,
                // The script plays both sides: read the OTP off the
                // customer's own view of the order.
                None => {
                    let order = fetch(engine, binding).await?;
                    order
                        .delivery_otp
                        .map(|otp| otp.as_str().to_string())
                        .ok_or(OrderError::MissingChallenge)?
                }
            };
            engine
                .verify_delivery_otp(&identity, &binding.order_id, &code)
                .await?;
        }
    }
    Ok(())
}

async fn fetch(engine: &OrderEngine, binding: &Binding) -> CoreResult<Order> {
    engine
        .orders_for_customer(&binding.owner)
        .await?
        .into_iter()
        .find(|order| order.id == binding.order_id)
        .ok_or(OrderError::NotFound("Order"))
}
