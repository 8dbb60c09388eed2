//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when a document does not exist or was
//!   soft-deleted.
//! - [`ExistingKey`] thrown when a unique name is already taken.
//! - [`InvalidField`] thrown when a free-form field such as a description,
//!   an email or a password is rejected.
//! - [`CounterUnderflow`] thrown when an `instances` counter would become
//!   negative, which means the stored counters are out of sync.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`InvalidField`]: EngineError::InvalidField
//!  [`CounterUnderflow`]: EngineError::CounterUnderflow
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid payments: {0}")]
    InvalidPayments(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid field: {0}")]
    InvalidField(String),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("Counter underflow: {0}")]
    CounterUnderflow(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidPayments(a), Self::InvalidPayments(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidField(a), Self::InvalidField(b)) => a == b,
            (Self::InvalidReference(a), Self::InvalidReference(b)) => a == b,
            (Self::CounterUnderflow(a), Self::CounterUnderflow(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
