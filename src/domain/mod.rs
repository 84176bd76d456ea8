//! Domain model: the order entity, its lifecycle rules, and the ports the
//! engine depends on.

pub mod identity;
pub mod order;
pub mod otp;
pub mod ports;
