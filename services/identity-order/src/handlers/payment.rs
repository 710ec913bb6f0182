//! Payment-intent creation
//!
//! Delegates to the external processor and attaches the returned
//! correlation id to the order, moving it into PaymentProcessing.

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{AppJson, CreateIntentRequest, CreateIntentResponse};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;

pub async fn create_intent(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, AppError> {
    let order = state.orders.get(&payload.order_id).await?;
    if order.buyer_id != user.user_id {
        return Err(AppError::Unauthorized(
            "Only the buyer can start payment".to_string(),
        ));
    }
    if payload.amount != order.total_amount {
        return Err(AppError::Validation(
            "Amount does not match order total".to_string(),
        ));
    }

    let intent = state
        .payments
        .create_intent(payload.amount, &order.id)
        .await?;

    state
        .orders
        .attach_payment_intent(&order.id, &intent.id, Utc::now())
        .await?;

    tracing::info!(order_id = %order.id, intent_id = %intent.id, "payment intent attached");
    Ok(Json(CreateIntentResponse {
        client_secret: intent.client_secret,
    }))
}
