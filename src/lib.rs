//! Order lifecycle core for a food-delivery marketplace: server-trusted
//! pricing at creation, an explicit status transition table, OTP-gated
//! delivery confirmation, and inferred refunds.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
