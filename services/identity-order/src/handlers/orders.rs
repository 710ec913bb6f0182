//! Order creation and lifecycle endpoints
//!
//! The buyer identity always comes from the bearer token, and party
//! names are denormalized from the credential store at creation time
//! rather than trusted from the request body.

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{AdvanceOrderRequest, AppJson, CreateOrderRequest, ScheduleMeetingRequest};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use types::errors::AccountError;
use types::ids::{OrderId, UserId};
use types::order::Order;

pub async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let buyer = state
        .credentials
        .find_by_id(&user.user_id)
        .await?
        .ok_or(AccountError::NotFound)?;
    let seller = state
        .credentials
        .find_by_id(&payload.seller_id)
        .await?
        .ok_or(AccountError::NotFound)?;

    let order = Order::new(
        buyer.id,
        buyer.full_name,
        seller.id,
        seller.full_name,
        payload.items,
        Utc::now(),
    )?;

    state.orders.insert(order.clone()).await?;
    tracing::info!(order_id = %order.id, buyer = %order.buyer_id, seller = %order.seller_id, "order created");
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_for_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Order>>, AppError> {
    if user.user_id != user_id {
        return Err(AppError::Unauthorized(
            "Cannot view another user's orders".to_string(),
        ));
    }
    let orders = state.orders.list_for_user(&user_id).await?;
    Ok(Json(orders))
}

pub async fn advance_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<OrderId>,
    AppJson(payload): AppJson<AdvanceOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.orders.get(&order_id).await?;
    if !order.involves(&user.user_id) {
        return Err(AppError::Unauthorized(
            "Cannot modify another user's order".to_string(),
        ));
    }

    // The store revalidates the transition under its own lock, so a
    // concurrent racer cannot slip through this read.
    let updated = state
        .orders
        .advance(&order_id, payload.status, Utc::now())
        .await?;
    tracing::info!(order_id = %updated.id, status = %updated.status, "order advanced");
    Ok(Json(updated))
}

pub async fn schedule_meeting(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<OrderId>,
    AppJson(payload): AppJson<ScheduleMeetingRequest>,
) -> Result<Json<Order>, AppError> {
    if payload.location.trim().is_empty() {
        return Err(AppError::Validation(
            "Meeting location required".to_string(),
        ));
    }

    let order = state.orders.get(&order_id).await?;
    if !order.involves(&user.user_id) {
        return Err(AppError::Unauthorized(
            "Cannot modify another user's order".to_string(),
        ));
    }

    let updated = state
        .orders
        .schedule_meeting(&order_id, payload.location.trim(), payload.time, Utc::now())
        .await?;
    tracing::info!(order_id = %updated.id, "meeting scheduled");
    Ok(Json(updated))
}
