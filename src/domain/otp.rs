use rand::Rng;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// Wrong submissions tolerated before verification locks. The operator
/// re-issues the code (out_for_delivery self-transition) to reset.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

/// The 4-digit code a customer presents at handoff to prove delivery.
///
/// Generated from OS entropy when an order goes out for delivery, cleared
/// on successful verification. Stored as a string so comparison against the
/// submitted value is exact.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(transparent)]
pub struct DeliveryOtp(String);

impl DeliveryOtp {
    /// Draws a fresh code in 1000..=9999 (no leading zeros).
    pub fn generate() -> Self {
        Self(OsRng.gen_range(1000u16..=9999).to_string())
    }

    /// Compares against a submitted value, ignoring surrounding whitespace.
    pub fn matches(&self, submitted: &str) -> bool {
        self.0 == submitted.trim()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
