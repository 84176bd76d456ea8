use crate::domain::order::{OperatorId, Order, OrderId, UserId};
use crate::domain::ports::OrderStore;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Column Family for storing orders.
pub const CF_ORDERS: &str = "orders";

/// A persistent order store backed by RocksDB.
///
/// Orders are stored as JSON under their id in a dedicated column family.
/// RocksDB has no native compare-and-swap, so `update` serializes its
/// read-check-write through a process-local mutex; this store assumes a
/// single writing process.
#[derive(Clone)]
pub struct RocksDbOrderStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbOrderStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the orders column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_orders])
            .map_err(|e| OrderError::Internal(Box::new(e)))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(CF_ORDERS)
            .ok_or_else(|| OrderError::Internal("Orders column family not found".into()))
    }

    fn read(&self, id: &OrderId) -> Result<Option<Order>> {
        let cf = self.cf()?;
        let bytes = self
            .db
            .get_cf(cf, id.as_str().as_bytes())
            .map_err(|e| OrderError::Internal(Box::new(e)))?;
        match bytes {
            Some(bytes) => {
                let order =
                    serde_json::from_slice(&bytes).map_err(|e| OrderError::Internal(Box::new(e)))?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    fn write(&self, order: &Order) -> Result<()> {
        let cf = self.cf()?;
        let value = serde_json::to_vec(order).map_err(|e| OrderError::Internal(Box::new(e)))?;
        self.db
            .put_cf(cf, order.id.as_str().as_bytes(), value)
            .map_err(|e| OrderError::Internal(Box::new(e)))?;
        Ok(())
    }

    fn scan<F>(&self, keep: F) -> Result<Vec<Order>>
    where
        F: Fn(&Order) -> bool,
    {
        let cf = self.cf()?;
        let mut matched = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item.map_err(|e| OrderError::Internal(Box::new(e)))?;
            let order: Order =
                serde_json::from_slice(&value).map_err(|e| OrderError::Internal(Box::new(e)))?;
            if keep(&order) {
                matched.push(order);
            }
        }
        // Newest first; id as tie-break keeps the ordering stable.
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_str().cmp(a.id.as_str()))
        });
        Ok(matched)
    }
}

#[async_trait]
impl OrderStore for RocksDbOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        self.write(&order)
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>> {
        self.read(id)
    }

    async fn update(&self, mut order: Order) -> Result<Order> {
        let guard = self
            .write_lock
            .lock()
            .map_err(|_| OrderError::Internal("order write lock poisoned".into()))?;
        let current = self.read(&order.id)?.ok_or(OrderError::NotFound("Order"))?;
        if current.version != order.version {
            return Err(OrderError::WriteConflict);
        }
        order.version += 1;
        self.write(&order)?;
        drop(guard);
        Ok(order)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        self.scan(|order| &order.user_id == user_id)
    }

    async fn list_by_operator(&self, operator_id: &OperatorId) -> Result<Vec<Order>> {
        self.scan(|order| &order.operator_id == operator_id)
    }
}
