use crate::handlers::{auth, orders, payment};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/orders", post(orders::create_order))
        .route("/orders/user/{user_id}", get(orders::list_for_user))
        .route("/orders/{id}/status", post(orders::advance_order))
        .route("/orders/{id}/meeting", post(orders::schedule_meeting))
        .route("/payment/create-intent", post(payment::create_intent))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
