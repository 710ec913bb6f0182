//! Account records and identity validation
//!
//! An account is either *unverified* (a pending code is attached) or
//! *verified* (code cleared, flag set); the transition is one-way.

use crate::errors::AccountError;
use crate::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Handle length bounds (inclusive)
pub const HANDLE_MIN_LEN: usize = 3;
pub const HANDLE_MAX_LEN: usize = 20;

/// A verification code waiting to be consumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    /// 6 ASCII digits
    pub code: String,
    #[serde(with = "crate::timestamp::iso8601")]
    pub issued_at: DateTime<Utc>,
}

/// A registered user identity with credentials and verification state
///
/// `password_hash` and `verification` never leave the service; the HTTP
/// layer exposes accounts through a separate response type, and the
/// serde attributes here are a second line of defense.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: UserId,
    /// Campus email, lowercase, unique
    pub email: String,
    /// Chosen handle, lowercase, unique
    pub handle: String,
    pub full_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_email_verified: bool,
    #[serde(skip_serializing, default)]
    pub verification: Option<PendingVerification>,
    pub avatar_url: Option<String>,
    /// Running average in 0.0..=5.0
    pub rating: f64,
    pub total_ratings: u32,
    #[serde(with = "crate::timestamp::iso8601")]
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new unverified account with a pending code
    pub fn new(
        email: String,
        handle: String,
        full_name: String,
        password_hash: String,
        verification_code: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            email,
            handle,
            full_name,
            password_hash,
            is_email_verified: false,
            verification: Some(PendingVerification {
                code: verification_code,
                issued_at: now,
            }),
            avatar_url: None,
            rating: 0.0,
            total_ratings: 0,
            created_at: now,
        }
    }

    /// Flip to verified and clear the pending code (irreversible)
    pub fn mark_verified(&mut self) {
        self.is_email_verified = true;
        self.verification = None;
    }
}

/// Trim and lowercase an email for lookup and storage
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trim and lowercase a handle for lookup and storage
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().to_lowercase()
}

/// Validate a chosen handle: 3-20 chars, alphanumeric/underscore/hyphen
pub fn validate_handle(handle: &str) -> Result<(), AccountError> {
    let len = handle.chars().count();
    if !(HANDLE_MIN_LEN..=HANDLE_MAX_LEN).contains(&len) {
        return Err(AccountError::Validation(format!(
            "Username must be {}-{} characters (letters, numbers, underscore, hyphen only)",
            HANDLE_MIN_LEN, HANDLE_MAX_LEN
        )));
    }
    if !handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AccountError::Validation(format!(
            "Username must be {}-{} characters (letters, numbers, underscore, hyphen only)",
            HANDLE_MIN_LEN, HANDLE_MAX_LEN
        )));
    }
    Ok(())
}

/// Validate that an email belongs to the campus domain
///
/// `domain` is matched as a suffix against the normalized email,
/// e.g. `@csu.fullerton.edu`.
pub fn validate_campus_email(email: &str, domain: &str) -> Result<(), AccountError> {
    let normalized = normalize_email(email);
    if normalized.len() <= domain.len() || !normalized.ends_with(domain) {
        return Err(AccountError::Validation(format!(
            "Must use a valid campus email address ({})",
            domain
        )));
    }
    Ok(())
}
