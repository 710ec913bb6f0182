//! Error types for the identity & order service
//!
//! Domain error taxonomy using thiserror. The HTTP layer translates
//! these into status codes; storage backends translate their own
//! failures into the `Unavailable` variants.

use thiserror::Error;

/// Account and authentication errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Deliberately identical for unknown identifier and wrong password
    /// so login responses cannot be used to enumerate accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found")]
    NotFound,

    #[error("Email already verified")]
    AlreadyVerified,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Verification code expired")]
    CodeExpired,

    #[error("Account store unavailable: {0}")]
    Unavailable(String),
}

/// Order ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order not found")]
    NotFound,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Order store unavailable: {0}")]
    Unavailable(String),
}
