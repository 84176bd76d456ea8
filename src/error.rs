use thiserror::Error;

pub type Result<T, E = OrderError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum OrderError {
    /// Malformed input: bad quantity, empty cart, unparseable enum value.
    #[error("Validation error: {0}")]
    Validation(String),
    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Ownership or role mismatch. Deliberately generic: the caller learns
    /// nothing beyond the denial itself.
    #[error("Unauthorized")]
    Forbidden,
    /// The requested status edge is not in the transition table.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    /// The operation requires a status the order is not in.
    #[error("Order is {current}, expected {needed}")]
    InvalidState { current: String, needed: String },
    #[error("Invalid OTP")]
    OtpMismatch,
    #[error("No OTP generated for this order")]
    MissingChallenge,
    /// Too many wrong OTP submissions; the operator must re-issue the code.
    #[error("OTP verification locked after repeated failures")]
    OtpLocked,
    #[error("This order is not a UPI order")]
    InvalidPaymentMethod,
    #[error("Order is already paid")]
    AlreadyPaid,
    /// The order was modified between read and write; the caller re-reads
    /// and re-validates.
    #[error("Concurrent modification of order")]
    WriteConflict,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}
