use crate::domain::identity::{Identity, Role};
use crate::domain::order::{
    MenuItemId, OperatorId, Order, OrderId, OrderItem, OrderStatus, PaymentMethod, Quantity,
    UserId,
};
use crate::domain::ports::{CatalogBox, OperatorDirectoryBox, OrderStoreBox};
use crate::error::{OrderError, Result};

/// Lost-race retries before a mutation gives up. Each retry re-reads and
/// re-validates against the fresh snapshot.
const CAS_RETRY_LIMIT: usize = 8;

/// One requested line of a new order. Quantity is raw here; the engine
/// validates it, and price/name are never accepted from the caller.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub operator_id: OperatorId,
    pub items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
}

/// The order lifecycle engine.
///
/// Holds the store and the two external collaborators (catalog, operator
/// directory) behind ports. Every public operation takes an explicit,
/// already-verified [`Identity`]; there is no ambient session state.
pub struct OrderEngine {
    orders: OrderStoreBox,
    catalog: CatalogBox,
    operators: OperatorDirectoryBox,
}

impl OrderEngine {
    pub fn new(orders: OrderStoreBox, catalog: CatalogBox, operators: OperatorDirectoryBox) -> Self {
        Self {
            orders,
            catalog,
            operators,
        }
    }

    /// Places a new order for `customer` against one operator.
    ///
    /// Prices and names are frozen from the catalog at this instant. Items
    /// that no longer exist are dropped silently; an order where every item
    /// dropped out fails instead of going through empty.
    pub async fn place_order(
        &self,
        customer: &Identity,
        request: PlaceOrderRequest,
    ) -> Result<Order> {
        require_role(customer, Role::Customer)?;

        if request.items.is_empty() {
            return Err(OrderError::Validation("No items provided".to_string()));
        }

        let operator = self
            .operators
            .lookup(&request.operator_id)
            .await?
            .ok_or(OrderError::NotFound("Operator"))?;

        let mut items = Vec::new();
        for line in &request.items {
            // Quantity is checked for every requested line, even one whose
            // item drops out below.
            let quantity = Quantity::new(line.quantity)?;

            let Some(entry) = self.catalog.lookup(&line.menu_item_id).await? else {
                continue;
            };
            items.push(OrderItem {
                menu_item_id: line.menu_item_id.clone(),
                name: entry.name,
                price: entry.price,
                quantity,
                image: entry.image,
            });
        }

        if items.is_empty() {
            return Err(OrderError::Validation(
                "No valid menu items found".to_string(),
            ));
        }

        let order = Order::new(
            customer,
            request.operator_id,
            operator.restaurant_name,
            items,
            request.payment_method,
        );
        self.orders.insert(order.clone()).await?;
        Ok(order)
    }

    /// Operator-driven status change along the transition table. The
    /// returned order never carries the OTP.
    pub async fn transition(
        &self,
        operator: &Identity,
        order_id: &OrderId,
        target: OrderStatus,
        reason: Option<&str>,
    ) -> Result<Order> {
        require_role(operator, Role::Operator)?;
        let updated = self
            .mutate(order_id, |order| {
                owned_by_operator(order, operator)?;
                order.transition(target, reason)
            })
            .await?;
        Ok(updated.without_otp())
    }

    /// OTP challenge-response; the only path to `delivered`.
    ///
    /// A mismatch is the one failure that writes back (the attempt counter),
    /// so it gets its own read-check-write loop instead of [`Self::mutate`].
    pub async fn verify_delivery_otp(
        &self,
        operator: &Identity,
        order_id: &OrderId,
        submitted: &str,
    ) -> Result<Order> {
        require_role(operator, Role::Operator)?;
        if submitted.trim().is_empty() {
            return Err(OrderError::Validation("OTP is required".to_string()));
        }

        for _ in 0..CAS_RETRY_LIMIT {
            let mut order = self
                .orders
                .get(order_id)
                .await?
                .ok_or(OrderError::NotFound("Order"))?;
            owned_by_operator(&order, operator)?;

            match order.confirm_delivery(submitted) {
                Ok(()) => match self.orders.update(order).await {
                    Ok(updated) => return Ok(updated),
                    Err(OrderError::WriteConflict) => continue,
                    Err(e) => return Err(e),
                },
                Err(OrderError::OtpMismatch) => match self.orders.update(order).await {
                    Ok(_) => return Err(OrderError::OtpMismatch),
                    Err(OrderError::WriteConflict) => continue,
                    Err(e) => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
        Err(OrderError::WriteConflict)
    }

    /// Customer's cancellation request; the operator still adjudicates it
    /// via [`Self::transition`].
    pub async fn request_cancellation(
        &self,
        customer: &Identity,
        order_id: &OrderId,
        reason: Option<&str>,
    ) -> Result<Order> {
        require_role(customer, Role::Customer)?;
        self.mutate(order_id, |order| {
            owned_by_customer(order, customer)?;
            order.request_cancellation(reason)
        })
        .await
    }

    /// Simulated UPI payment confirmation for the owning customer.
    pub async fn confirm_upi_payment(
        &self,
        customer: &Identity,
        order_id: &OrderId,
    ) -> Result<Order> {
        require_role(customer, Role::Customer)?;
        self.mutate(order_id, |order| {
            owned_by_customer(order, customer)?;
            order.confirm_payment()
        })
        .await
    }

    /// The customer's own orders, newest first.
    pub async fn orders_for_customer(&self, customer: &Identity) -> Result<Vec<Order>> {
        require_role(customer, Role::Customer)?;
        self.orders
            .list_by_user(&UserId::new(customer.id.clone()))
            .await
    }

    /// The operator's orders, newest first, with OTPs stripped.
    pub async fn orders_for_operator(&self, operator: &Identity) -> Result<Vec<Order>> {
        require_role(operator, Role::Operator)?;
        let orders = self
            .orders
            .list_by_operator(&OperatorId::new(operator.id.clone()))
            .await?;
        Ok(orders.iter().map(Order::without_otp).collect())
    }

    /// Atomic read-modify-write: validity checks and the mutation run
    /// against one snapshot, and a lost compare-and-swap re-runs the whole
    /// check on a fresh read. Failed checks never reach the store.
    async fn mutate<F>(&self, order_id: &OrderId, mut apply: F) -> Result<Order>
    where
        F: FnMut(&mut Order) -> Result<()>,
    {
        for _ in 0..CAS_RETRY_LIMIT {
            let mut order = self
                .orders
                .get(order_id)
                .await?
                .ok_or(OrderError::NotFound("Order"))?;
            apply(&mut order)?;
            match self.orders.update(order).await {
                Ok(updated) => return Ok(updated),
                Err(OrderError::WriteConflict) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(OrderError::WriteConflict)
    }
}

fn require_role(identity: &Identity, role: Role) -> Result<()> {
    if identity.role == role {
        Ok(())
    } else {
        Err(OrderError::Forbidden)
    }
}

fn owned_by_operator(order: &Order, operator: &Identity) -> Result<()> {
    if order.operator_id.as_str() == operator.id {
        Ok(())
    } else {
        Err(OrderError::Forbidden)
    }
}

fn owned_by_customer(order: &Order, customer: &Identity) -> Result<()> {
    if order.user_id.as_str() == customer.id {
        Ok(())
    } else {
        Err(OrderError::Forbidden)
    }
}
