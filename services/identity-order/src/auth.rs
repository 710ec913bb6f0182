//! Session issuance and validation
//!
//! Tokens are signed HS256 bearer credentials with an expiry; nothing
//! is stored server-side, so there is no revocation list in this core.

use crate::error::AppError;
use crate::state::AppState;
use crate::store::CredentialStore;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use types::account::{Account, normalize_email, normalize_handle};
use types::errors::AccountError;
use types::ids::UserId;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub user_id: UserId,
    pub exp: usize,
    pub iat: usize,
}

/// Hash a password with argon2 and a fresh random salt
///
/// Deliberately slow; call it through [`hash_password_blocking`] from
/// async code.
pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt: [u8; 16] = rand::thread_rng().r#gen();
    argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())
        .map_err(|e| AccountError::Unavailable(format!("password hashing failed: {e}")))
}

/// Run the argon2 hash on a blocking thread
pub async fn hash_password_blocking(password: String) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AccountError::Unavailable(format!("hash task failed: {e}")))?
}

/// Validates credentials and issues/decodes signed bearer tokens
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl SessionIssuer {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Issue a token embedding the account identity and an expiry
    pub fn issue(&self, account: &Account) -> Result<String, AccountError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            user_id: account.id,
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AccountError::Unavailable(format!("token signing failed: {e}")))
    }

    /// Decode and validate a token; expired, malformed, and badly
    /// signed tokens all collapse into the same credential error.
    pub fn validate(&self, token: &str) -> Result<Claims, AccountError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AccountError::InvalidCredentials)
    }

    /// Look up the account by email or handle and verify the password.
    ///
    /// Lookup miss and hash mismatch produce the identical error so the
    /// response cannot be used to enumerate accounts.
    pub async fn login(
        &self,
        store: &dyn CredentialStore,
        identifier: &str,
        password: &str,
    ) -> Result<(Account, String), AccountError> {
        let account = if identifier.contains('@') {
            store.find_by_email(&normalize_email(identifier)).await?
        } else {
            store.find_by_handle(&normalize_handle(identifier)).await?
        };
        let account = account.ok_or(AccountError::InvalidCredentials)?;

        let hash = account.password_hash.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || {
            argon2::verify_encoded(&hash, password.as_bytes()).unwrap_or(false)
        })
        .await
        .map_err(|e| AccountError::Unavailable(format!("verify task failed: {e}")))?;

        if !matches {
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.issue(&account)?;
        Ok((account, token))
    }
}

/// Extractor for authenticated endpoints; reads `Authorization: Bearer`
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing authentication credentials".to_string()))?;
        let raw = header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
        let token = raw
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".to_string()))?;

        let claims = state.sessions.validate(token)?;
        Ok(Self {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}
