//! Identity & order service for the campus marketplace
//!
//! Turns unauthenticated registration requests into verified accounts,
//! credentials into bearer tokens, and carts into tracked orders moving
//! through a fixed lifecycle. Everything is stateless per request; the
//! only shared state lives behind the store traits.

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod handlers;
pub mod models;
pub mod payment;
pub mod rate_limit;
pub mod router;
pub mod state;
pub mod store;
pub mod verification;
