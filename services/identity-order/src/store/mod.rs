//! Durable-store contracts for accounts and orders
//!
//! Handlers only see these traits; the in-memory implementations in
//! `memory` back them for local runs and tests, and a durable backend
//! can be swapped in without touching the handlers. Every mutating
//! method is a single atomic operation against the store, so a client
//! disconnecting mid-request never leaves a half-updated record.

mod memory;

pub use memory::{MemoryCredentialStore, MemoryOrderStore};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use types::account::Account;
use types::errors::{AccountError, OrderError};
use types::ids::{OrderId, UserId};
use types::order::{Order, OrderStatus};

/// Persistence of account records, indexed by id with unique secondary
/// indexes on campus email and handle.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, AccountError>;

    /// `email` must already be normalized (lowercase)
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    /// `handle` must already be normalized (lowercase)
    async fn find_by_handle(&self, handle: &str) -> Result<Option<Account>, AccountError>;

    /// Insert a new account; fails with `Conflict` if the email or the
    /// handle is already taken by another record.
    async fn put_new(&self, account: Account) -> Result<(), AccountError>;

    /// Atomically consume a verification code: checks existence,
    /// verified state, exact code match, and code age, then clears the
    /// code and flips the flag in one store operation.
    async fn complete_verification(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
        code_ttl: Duration,
    ) -> Result<Account, AccountError>;
}

/// Persistence of orders with status-guarded mutations
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> Result<(), OrderError>;

    async fn get(&self, id: &OrderId) -> Result<Order, OrderError>;

    /// Pending -> PaymentProcessing, recording the correlation id
    async fn attach_payment_intent(
        &self,
        id: &OrderId,
        intent_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError>;

    /// Move along a permitted edge; racing calls serialize and the
    /// loser observes `InvalidTransition`.
    async fn advance(
        &self,
        id: &OrderId,
        target: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError>;

    async fn schedule_meeting(
        &self,
        id: &OrderId,
        location: &str,
        time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError>;

    /// Orders where the user is buyer or seller, newest first
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Order>, OrderError>;
}
