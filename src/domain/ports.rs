use super::order::{MenuItemId, OperatorId, Order, OrderId, Price, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// Authoritative catalog entry resolved at order-creation time.
#[derive(Debug, PartialEq, Clone)]
pub struct CatalogItem {
    pub name: String,
    pub price: Price,
    pub image: String,
}

/// Operator profile as known to the directory.
#[derive(Debug, PartialEq, Clone)]
pub struct OperatorProfile {
    pub restaurant_name: String,
}

/// Durable collection of orders.
///
/// `update` is a compare-and-swap on `Order::version`: it persists the
/// given order only if the stored version still matches, bumping the
/// version on success and failing with `WriteConflict` otherwise. This is
/// what makes every engine operation an atomic read-modify-write.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> Result<()>;
    async fn get(&self, id: &OrderId) -> Result<Option<Order>>;
    async fn update(&self, order: Order) -> Result<Order>;
    /// Newest-first orders for one customer.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>>;
    /// Newest-first orders for one operator.
    async fn list_by_operator(&self, operator_id: &OperatorId) -> Result<Vec<Order>>;
}

/// Catalog Lookup collaborator; the source of truth for names and prices.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn lookup(&self, id: &MenuItemId) -> Result<Option<CatalogItem>>;
}

/// Operator existence check collaborator.
#[async_trait]
pub trait OperatorDirectory: Send + Sync {
    async fn lookup(&self, id: &OperatorId) -> Result<Option<OperatorProfile>>;
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type CatalogBox = Box<dyn Catalog>;
pub type OperatorDirectoryBox = Box<dyn OperatorDirectory>;
