use crate::domain::order::{MenuItemId, OperatorId, Order, OrderId, UserId};
use crate::domain::ports::{Catalog, CatalogItem, OperatorDirectory, OperatorProfile, OrderStore};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory order store.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. `update` is a
/// compare-and-swap on `Order::version`: holding the write lock across the
/// version check and the insert is what makes each commit atomic. A
/// monotonic insertion sequence backs deterministic newest-first listings.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, (u64, Order)>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn list_filtered<F>(&self, keep: F) -> Vec<Order>
    where
        F: Fn(&Order) -> bool,
    {
        let orders = self.orders.read().await;
        let mut matched: Vec<(u64, Order)> = orders
            .values()
            .filter(|(_, order)| keep(order))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.0.cmp(&a.0));
        matched.into_iter().map(|(_, order)| order).collect()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        orders.insert(order.id.clone(), (seq, order));
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(id).map(|(_, order)| order.clone()))
    }

    async fn update(&self, mut order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let Some((seq, current)) = orders.get(&order.id) else {
            return Err(OrderError::NotFound("Order"));
        };
        if current.version != order.version {
            return Err(OrderError::WriteConflict);
        }
        order.version += 1;
        let seq = *seq;
        orders.insert(order.id.clone(), (seq, order.clone()));
        Ok(order)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        Ok(self.list_filtered(|order| &order.user_id == user_id).await)
    }

    async fn list_by_operator(&self, operator_id: &OperatorId) -> Result<Vec<Order>> {
        Ok(self
            .list_filtered(|order| &order.operator_id == operator_id)
            .await)
    }
}

/// In-memory catalog; stands in for the menu service at the boundary.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    items: Arc<std::sync::RwLock<HashMap<MenuItemId, CatalogItem>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: MenuItemId, item: CatalogItem) {
        if let Ok(mut items) = self.items.write() {
            items.insert(id, item);
        }
    }

    pub fn remove(&self, id: &MenuItemId) {
        if let Ok(mut items) = self.items.write() {
            items.remove(id);
        }
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn lookup(&self, id: &MenuItemId) -> Result<Option<CatalogItem>> {
        let items = self
            .items
            .read()
            .map_err(|_| OrderError::Internal("catalog lock poisoned".into()))?;
        Ok(items.get(id).cloned())
    }
}

/// In-memory operator directory.
#[derive(Default, Clone)]
pub struct InMemoryOperatorDirectory {
    operators: Arc<std::sync::RwLock<HashMap<OperatorId, OperatorProfile>>>,
}

impl InMemoryOperatorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: OperatorId, profile: OperatorProfile) {
        if let Ok(mut operators) = self.operators.write() {
            operators.insert(id, profile);
        }
    }
}

#[async_trait]
impl OperatorDirectory for InMemoryOperatorDirectory {
    async fn lookup(&self, id: &OperatorId) -> Result<Option<OperatorProfile>> {
        let operators = self
            .operators
            .read()
            .map_err(|_| OrderError::Internal("operator directory lock poisoned".into()))?;
        Ok(operators.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::Identity;
    use crate::domain::order::{OrderItem, PaymentMethod, Price, Quantity};
    use rust_decimal_macros::dec;

    fn sample_order(user: &str) -> Order {
        Order::new(
            &Identity::customer(user, "x@example.com", "X"),
            OperatorId::new("op1"),
            "Testaurant".to_string(),
            vec![OrderItem {
                menu_item_id: MenuItemId::new("burger"),
                name: "Burger".to_string(),
                price: Price::new(dec!(100.0)).unwrap(),
                quantity: Quantity::new(1).unwrap(),
                image: String::new(),
            }],
            PaymentMethod::Cod,
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryOrderStore::new();
        let order = sample_order("u1");
        store.insert(order.clone()).await.unwrap();

        let retrieved = store.get(&order.id).await.unwrap().unwrap();
        assert_eq!(retrieved, order);
        assert!(store.get(&OrderId::new("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = InMemoryOrderStore::new();
        let order = sample_order("u1");
        store.insert(order.clone()).await.unwrap();

        let updated = store.update(order.clone()).await.unwrap();
        assert_eq!(updated.version, 1);
        let again = store.update(updated).await.unwrap();
        assert_eq!(again.version, 2);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = InMemoryOrderStore::new();
        let order = sample_order("u1");
        store.insert(order.clone()).await.unwrap();

        // Two readers take the same snapshot; only one write wins.
        let a = store.get(&order.id).await.unwrap().unwrap();
        let b = store.get(&order.id).await.unwrap().unwrap();
        store.update(a).await.unwrap();
        assert!(matches!(
            store.update(b).await,
            Err(OrderError::WriteConflict)
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_order() {
        let store = InMemoryOrderStore::new();
        assert!(matches!(
            store.update(sample_order("u1")).await,
            Err(OrderError::NotFound("Order"))
        ));
    }

    #[tokio::test]
    async fn test_listings_filter_and_sort_newest_first() {
        let store = InMemoryOrderStore::new();
        let first = sample_order("u1");
        let second = sample_order("u1");
        let other = sample_order("u2");
        store.insert(first.clone()).await.unwrap();
        store.insert(second.clone()).await.unwrap();
        store.insert(other.clone()).await.unwrap();

        let mine = store.list_by_user(&UserId::new("u1")).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, second.id);
        assert_eq!(mine[1].id, first.id);

        let by_operator = store
            .list_by_operator(&OperatorId::new("op1"))
            .await
            .unwrap();
        assert_eq!(by_operator.len(), 3);
        assert_eq!(by_operator[0].id, other.id);
    }

    #[tokio::test]
    async fn test_catalog_and_directory_lookup() {
        let catalog = InMemoryCatalog::new();
        let id = MenuItemId::new("burger");
        catalog.insert(
            id.clone(),
            CatalogItem {
                name: "Burger".to_string(),
                price: Price::new(dec!(100.0)).unwrap(),
                image: String::new(),
            },
        );
        assert!(catalog.lookup(&id).await.unwrap().is_some());
        catalog.remove(&id);
        assert!(catalog.lookup(&id).await.unwrap().is_none());

        let operators = InMemoryOperatorDirectory::new();
        operators.insert(
            OperatorId::new("op1"),
            OperatorProfile {
                restaurant_name: "Testaurant".to_string(),
            },
        );
        assert!(
            operators
                .lookup(&OperatorId::new("op1"))
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            operators
                .lookup(&OperatorId::new("op2"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
