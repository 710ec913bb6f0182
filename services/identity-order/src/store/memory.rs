//! In-memory store implementations backed by DashMap
//!
//! Each record mutation runs under the map's per-key entry lock, which
//! is what makes the conditional writes atomic: two racing `advance`
//! calls on the same order serialize, and the loser revalidates against
//! the already-applied state.

use super::{CredentialStore, OrderStore};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use types::account::Account;
use types::errors::{AccountError, OrderError};
use types::ids::{OrderId, UserId};
use types::order::{Order, OrderStatus};

/// Account store with unique indexes on email and handle
#[derive(Default)]
pub struct MemoryCredentialStore {
    accounts: DashMap<UserId, Account>,
    email_index: DashMap<String, UserId>,
    handle_index: DashMap<String, UserId>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, AccountError> {
        Ok(self.accounts.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        // Copy the id out so no index guard is held across the await.
        let id = match self.email_index.get(email) {
            Some(entry) => *entry,
            None => return Ok(None),
        };
        self.find_by_id(&id).await
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<Account>, AccountError> {
        let id = match self.handle_index.get(handle) {
            Some(entry) => *entry,
            None => return Ok(None),
        };
        self.find_by_id(&id).await
    }

    async fn put_new(&self, account: Account) -> Result<(), AccountError> {
        // Reserve the email key, then the handle key. Each reservation
        // is atomic under its entry lock; the email reservation is
        // rolled back if the handle turns out to be taken.
        match self.email_index.entry(account.email.clone()) {
            Entry::Occupied(_) => {
                return Err(AccountError::Conflict(
                    "Campus email already registered".to_string(),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(account.id);
            }
        }

        match self.handle_index.entry(account.handle.clone()) {
            Entry::Occupied(_) => {
                self.email_index.remove(&account.email);
                return Err(AccountError::Conflict("Username already taken".to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(account.id);
            }
        }

        self.accounts.insert(account.id, account);
        Ok(())
    }

    async fn complete_verification(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
        code_ttl: Duration,
    ) -> Result<Account, AccountError> {
        let id = match self.email_index.get(email) {
            Some(id) => *id,
            None => return Err(AccountError::NotFound),
        };

        // All checks and the flag flip happen under the record's lock.
        let mut entry = self.accounts.get_mut(&id).ok_or(AccountError::NotFound)?;
        let account = entry.value_mut();

        if account.is_email_verified {
            return Err(AccountError::AlreadyVerified);
        }
        let pending = account
            .verification
            .as_ref()
            .ok_or(AccountError::InvalidCode)?;
        if pending.code != code {
            return Err(AccountError::InvalidCode);
        }
        if now - pending.issued_at > code_ttl {
            return Err(AccountError::CodeExpired);
        }

        account.mark_verified();
        Ok(account.clone())
    }
}

/// Order store; mutations delegate to the state machine on `Order`
/// while holding the record's entry lock.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: DashMap<OrderId, Order>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutate<F>(&self, id: &OrderId, op: F) -> Result<Order, OrderError>
    where
        F: FnOnce(&mut Order) -> Result<(), OrderError>,
    {
        let mut entry = self.orders.get_mut(id).ok_or(OrderError::NotFound)?;
        let order = entry.value_mut();
        op(order)?;
        Ok(order.clone())
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<(), OrderError> {
        self.orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> Result<Order, OrderError> {
        self.orders
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(OrderError::NotFound)
    }

    async fn attach_payment_intent(
        &self,
        id: &OrderId,
        intent_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        self.mutate(id, |order| {
            order.attach_payment_intent(intent_id.to_string(), now)
        })
    }

    async fn advance(
        &self,
        id: &OrderId,
        target: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        self.mutate(id, |order| order.advance(target, now))
    }

    async fn schedule_meeting(
        &self,
        id: &OrderId,
        location: &str,
        time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        self.mutate(id, |order| {
            order.schedule_meeting(location.to_string(), time, now)
        })
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Order>, OrderError> {
        // Full scan, like the reference backend. Fine at campus scale;
        // a durable backend would index on the party ids.
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.value().involves(user))
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.as_uuid().cmp(a.id.as_uuid())));
        Ok(orders)
    }
}
