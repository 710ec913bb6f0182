//! Verification-code issuance and consumption
//!
//! Codes are uniformly random 6-digit numbers, single-use, and expire
//! after a configurable TTL. The expiry is a hardening addition; the
//! reference backend kept codes valid forever.

use crate::email::Mailer;
use crate::store::CredentialStore;
use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use types::account::{Account, normalize_email};
use types::errors::AccountError;

pub struct VerificationManager {
    store: Arc<dyn CredentialStore>,
    mailer: Arc<dyn Mailer>,
    code_ttl: Duration,
}

impl VerificationManager {
    pub fn new(store: Arc<dyn CredentialStore>, mailer: Arc<dyn Mailer>, code_ttl_secs: i64) -> Self {
        Self {
            store,
            mailer,
            code_ttl: Duration::seconds(code_ttl_secs),
        }
    }

    /// Generate a 6-digit code; the low values below 100000 are
    /// excluded so the code always has a fixed 6-digit width.
    pub fn generate_code() -> String {
        rand::thread_rng().gen_range(100_000..=999_999).to_string()
    }

    /// Send the account's pending code out of band. Best-effort: a
    /// delivery failure is logged and swallowed so registration never
    /// fails on a mail outage.
    pub async fn issue(&self, account: &Account) {
        let Some(pending) = &account.verification else {
            return;
        };
        match self.mailer.send_verification(&account.email, &pending.code).await {
            Ok(()) => tracing::info!(email = %account.email, "verification email sent"),
            Err(err) => {
                tracing::warn!(email = %account.email, error = %err, "verification email delivery failed");
            }
        }
    }

    /// Consume a code exactly once: clears it and flips the verified
    /// flag atomically in the store.
    pub async fn consume(&self, email: &str, code: &str) -> Result<Account, AccountError> {
        self.store
            .complete_verification(&normalize_email(email), code, Utc::now(), self.code_ttl)
            .await
    }
}
