//! Types library for the campus marketplace
//!
//! This library provides the core type definitions shared across the
//! identity & order service: identifiers, account records, the order
//! lifecycle state machine, timestamp codecs, and the error taxonomy.
//!
//! # Modules
//! - `ids`: Unique identifiers (UserId, OrderId, ProductId)
//! - `account`: Account records and identity validation
//! - `order`: Order snapshot and status lifecycle
//! - `timestamp`: ISO-8601 timestamp serialization helpers
//! - `errors`: Error taxonomy

// Public modules
pub mod account;
pub mod errors;
pub mod ids;
pub mod order;
pub mod timestamp;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::account::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::order::*;
}
