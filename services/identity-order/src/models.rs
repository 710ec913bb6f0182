//! Request/response bodies for the HTTP surface
//!
//! Wire names are camelCase to stay compatible with the mobile client.
//! The account response type is the only way account data leaves the
//! service, so password hashes and verification codes simply have no
//! field to travel in.

use crate::error::AppError;
use axum::Json;
use axum::extract::{FromRequest, Request};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use types::account::Account;
use types::ids::{OrderId, UserId};
use types::order::{LineItem, OrderStatus};

/// Json extractor that maps body rejections onto the 400 taxonomy
/// instead of axum's default 422.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub csuf_email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Email or handle
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub csuf_email: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub user_id: UserId,
    pub csuf_email: String,
    pub username: String,
    pub full_name: String,
    pub is_email_verified: bool,
    #[serde(rename = "profileImageURL")]
    pub profile_image_url: Option<String>,
    pub rating: f64,
    pub total_ratings: u32,
    #[serde(with = "types::timestamp::iso8601")]
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.id,
            csuf_email: account.email,
            username: account.handle,
            full_name: account.full_name,
            is_email_verified: account.is_email_verified,
            profile_image_url: account.avatar_url,
            rating: account.rating,
            total_ratings: account.total_ratings,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: AccountResponse,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub seller_id: UserId,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvanceOrderRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleMeetingRequest {
    pub location: String,
    #[serde(with = "types::timestamp::iso8601")]
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub order_id: OrderId,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
}
