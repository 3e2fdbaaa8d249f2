use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    /// A malformed or unrecognized inbound message, or an invalid amount.
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// The acquirer explicitly acknowledged the operation as failed.
    #[error("Gateway failure ({code}): {message}")]
    GatewayFailure { code: String, message: String },
    #[error("Cannot {operation} a payment in state '{state}'")]
    StateConflict {
        operation: &'static str,
        state: &'static str,
    },
    #[error("Refund of {requested} exceeds the refundable balance of {balance}")]
    RefundExceedsBalance { requested: Decimal, balance: Decimal },
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(e: rocksdb::Error) -> Self {
        PaymentError::InternalError(Box::new(e))
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(e: serde_json::Error) -> Self {
        PaymentError::InternalError(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
