//! The module contains the errors the engine can throw.
//!
//! Every kind maps to a caller/domain fault except [`ConcurrentModification`],
//! which is the only retryable one: the caller is expected to re-issue the
//! same logical request.
//!
//! [`ConcurrentModification`]: EngineError::ConcurrentModification
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Batch fully consumed: {0}")]
    BatchFullyConsumed(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),
    #[error("No consumption data for invoice {0}")]
    NoConsumptionData(String),
    #[error("Commission type mismatch: {0}")]
    CommissionTypeMismatch(String),
    #[error("Commission rule not applicable: {0}")]
    RuleNotApplicable(String),
    #[error("Agent sale already confirmed: {0}")]
    SaleAlreadyConfirmed(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Concurrent modification of {0}, retry the request")]
    ConcurrentModification(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Whether the caller may safely retry the same logical request.
    ///
    /// Only lost optimistic-concurrency races are retryable; every other kind
    /// is a caller/domain error and must not be retried automatically.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidQuantity(a), Self::InvalidQuantity(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::BatchFullyConsumed(a), Self::BatchFullyConsumed(b)) => a == b,
            (Self::InsufficientStock(a), Self::InsufficientStock(b)) => a == b,
            (Self::InvoiceNotFound(a), Self::InvoiceNotFound(b)) => a == b,
            (Self::NoConsumptionData(a), Self::NoConsumptionData(b)) => a == b,
            (Self::CommissionTypeMismatch(a), Self::CommissionTypeMismatch(b)) => a == b,
            (Self::RuleNotApplicable(a), Self::RuleNotApplicable(b)) => a == b,
            (Self::SaleAlreadyConfirmed(a), Self::SaleAlreadyConfirmed(b)) => a == b,
            (Self::InvalidStatus(a), Self::InvalidStatus(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ConcurrentModification(a), Self::ConcurrentModification(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
