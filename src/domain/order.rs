use crate::domain::identity::Identity;
use crate::domain::otp::{DeliveryOtp, MAX_OTP_ATTEMPTS};
use crate::error::OrderError;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::OsRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(OrderId);
opaque_id!(UserId);
opaque_id!(OperatorId);
opaque_id!(MenuItemId);

impl OrderId {
    /// Opaque 128-bit id, hex-encoded, drawn from OS entropy.
    pub fn generate() -> Self {
        Self(format!("{:032x}", OsRng.r#gen::<u128>()))
    }
}

/// A unit price frozen from the catalog at order time.
///
/// Wrapper around `rust_decimal::Decimal`; rejects negative values so a
/// poisoned catalog entry cannot produce a negative total.
#[derive(Debug, Serialize, Deserialize, PartialEq, PartialOrd, Clone, Copy)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Result<Self, OrderError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(OrderError::Validation("Price must not be negative".to_string()))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// Per-line quantity, restricted to 1..=50 so a client cannot inflate an
/// order arbitrarily.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 50;

    pub fn new(value: u32) -> Result<Self, OrderError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(OrderError::Validation(format!(
                "Invalid item quantity (must be {}-{})",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Quantity {
    type Error = OrderError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A line item with name/price snapshotted from the catalog at creation.
/// Never re-read afterward, even if the catalog entry changes or vanishes.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price: Price,
    pub quantity: Quantity,
    #[serde(default)]
    pub image: String,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.price.value() * Decimal::from(self.quantity.value())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Rejected,
    Cancelled,
    CancelRequested,
}

/// Allowed operator-driven edges. `Delivered` never appears as a target:
/// that state is reachable only through OTP verification. Terminal states
/// have no outgoing edges.
const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (
        OrderStatus::Pending,
        &[
            OrderStatus::Confirmed,
            OrderStatus::Rejected,
            OrderStatus::CancelRequested,
        ],
    ),
    (
        OrderStatus::Confirmed,
        &[OrderStatus::Preparing, OrderStatus::CancelRequested],
    ),
    (OrderStatus::Preparing, &[OrderStatus::OutForDelivery]),
    (OrderStatus::OutForDelivery, &[]),
    (
        OrderStatus::CancelRequested,
        &[
            OrderStatus::Cancelled,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
        ],
    ),
];

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Rejected,
        OrderStatus::Cancelled,
        OrderStatus::CancelRequested,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::CancelRequested => "cancel_requested",
        }
    }

    /// Targets reachable from this status via the operator transition table.
    pub fn successors(&self) -> &'static [OrderStatus] {
        TRANSITIONS
            .iter()
            .find(|(from, _)| from == self)
            .map(|(_, to)| *to)
            .unwrap_or(&[])
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.successors().contains(&target)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| OrderError::Validation(format!("Unknown order status '{s}'")))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Upi,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Upi => "upi",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(PaymentMethod::Cod),
            "upi" => Ok(PaymentMethod::Upi),
            other => Err(OrderError::Validation(format!(
                "paymentMethod must be 'cod' or 'upi', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// A customer's purchase against one restaurant operator.
///
/// Parties, line items and `total_amount` are fixed at creation; everything
/// that changes afterward goes through the transition methods below, which
/// enforce the lifecycle invariants. `version` is bumped by the store on
/// every committed write and backs its compare-and-swap.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Display fields captured at creation for historical fidelity; never
    /// re-synced if the source profile changes later.
    pub user_name: String,
    pub user_email: String,
    pub operator_id: OperatorId,
    pub restaurant_name: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery_otp: Option<DeliveryOtp>,
    #[serde(default)]
    pub otp_attempts: u32,
    #[serde(default)]
    pub rejection_reason: String,
    #[serde(default)]
    pub cancellation_reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Order {
    /// Assembles a new pending order. Items are already price-locked by the
    /// caller (the engine resolves them against the catalog); the total is
    /// computed here, once, and never re-derived.
    pub fn new(
        customer: &Identity,
        operator_id: OperatorId,
        restaurant_name: String,
        items: Vec<OrderItem>,
        payment_method: PaymentMethod,
    ) -> Self {
        let total_amount = items.iter().map(OrderItem::line_total).sum();
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            user_id: UserId::new(customer.id.clone()),
            user_name: customer.full_name.clone(),
            user_email: customer.email.clone(),
            operator_id,
            restaurant_name,
            items,
            total_amount,
            status: OrderStatus::Pending,
            payment_method,
            payment_status: PaymentStatus::Pending,
            delivery_otp: None,
            otp_attempts: 0,
            rejection_reason: String::new(),
            cancellation_reason: String::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Operator-driven status change.
    ///
    /// `Delivered` is rejected before anything else: that state is only
    /// reachable through [`Order::confirm_delivery`]. A target equal to the
    /// current status is an accepted no-op whose side effects still run, so
    /// an `out_for_delivery` self-transition re-issues the OTP.
    pub fn transition(
        &mut self,
        target: OrderStatus,
        reason: Option<&str>,
    ) -> Result<(), OrderError> {
        if target == OrderStatus::Delivered {
            return Err(OrderError::InvalidTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }

        if self.status != target && !self.status.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }

        if target == OrderStatus::OutForDelivery {
            self.delivery_otp = Some(DeliveryOtp::generate());
            self.otp_attempts = 0;
        }

        self.status = target;

        // Refund is inferred, not processed against a real gateway.
        if matches!(target, OrderStatus::Rejected | OrderStatus::Cancelled)
            && self.payment_status == PaymentStatus::Paid
        {
            self.payment_status = PaymentStatus::Refunded;
        }

        if target == OrderStatus::Rejected {
            self.rejection_reason = reason.unwrap_or_default().to_string();
        }
        if target == OrderStatus::Cancelled {
            self.cancellation_reason = match reason {
                Some(r) => r.to_string(),
                None if !self.cancellation_reason.is_empty() => self.cancellation_reason.clone(),
                None => "Cancelled by operator".to_string(),
            };
        }

        self.touch();
        Ok(())
    }

    /// OTP challenge-response proving physical handoff; the only path to
    /// `delivered`. A mismatch counts against the attempt budget, and once
    /// the budget is spent verification stays locked until the operator
    /// re-issues the code.
    pub fn confirm_delivery(&mut self, submitted: &str) -> Result<(), OrderError> {
        if self.status != OrderStatus::OutForDelivery {
            return Err(OrderError::InvalidState {
                current: self.status.to_string(),
                needed: OrderStatus::OutForDelivery.to_string(),
            });
        }

        // Unreachable while the OTP always rides along with
        // out_for_delivery, but handle it rather than panic.
        let Some(otp) = &self.delivery_otp else {
            return Err(OrderError::MissingChallenge);
        };

        if self.otp_attempts >= MAX_OTP_ATTEMPTS {
            return Err(OrderError::OtpLocked);
        }

        if !otp.matches(submitted) {
            self.otp_attempts += 1;
            self.touch();
            return Err(OrderError::OtpMismatch);
        }

        self.status = OrderStatus::Delivered;
        // Finalizes payment for COD (cash changes hands now) and acts as a
        // confirmation backstop for UPI.
        self.payment_status = PaymentStatus::Paid;
        self.delivery_otp = None;
        self.otp_attempts = 0;
        self.touch();
        Ok(())
    }

    /// Customer's cancellation ask; awaits operator adjudication and does
    /// not itself finalize anything.
    pub fn request_cancellation(&mut self, reason: Option<&str>) -> Result<(), OrderError> {
        if !matches!(self.status, OrderStatus::Pending | OrderStatus::Confirmed) {
            return Err(OrderError::InvalidState {
                current: self.status.to_string(),
                needed: "pending or confirmed".to_string(),
            });
        }
        self.status = OrderStatus::CancelRequested;
        self.cancellation_reason = reason
            .unwrap_or("User requested cancellation")
            .to_string();
        self.touch();
        Ok(())
    }

    /// Simulated UPI confirmation; trusted client stand-in for a gateway,
    /// gated by ownership at the engine.
    pub fn confirm_payment(&mut self) -> Result<(), OrderError> {
        if self.payment_method != PaymentMethod::Upi {
            return Err(OrderError::InvalidPaymentMethod);
        }
        if self.payment_status == PaymentStatus::Paid {
            return Err(OrderError::AlreadyPaid);
        }
        self.payment_status = PaymentStatus::Paid;
        self.touch();
        Ok(())
    }

    /// Copy with the OTP stripped, for operator-facing responses. The
    /// operator enters the code from the customer and must not read it.
    pub fn without_otp(&self) -> Self {
        let mut safe = self.clone();
        safe.delivery_otp = None;
        safe
    }
}
