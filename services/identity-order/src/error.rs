use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use types::errors::{AccountError, OrderError};

/// Central error type for the HTTP surface
///
/// Domain errors are translated here and nowhere else; handlers just
/// use `?`. Internal failures keep their cause server-side.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(msg) => AppError::Validation(msg),
            AccountError::Conflict(msg) => AppError::Conflict(msg),
            AccountError::InvalidCredentials => {
                AppError::Unauthorized("Invalid credentials".to_string())
            }
            AccountError::NotFound => AppError::NotFound("User not found".to_string()),
            AccountError::AlreadyVerified => {
                AppError::Validation("Email already verified".to_string())
            }
            AccountError::InvalidCode => {
                AppError::Validation("Invalid verification code".to_string())
            }
            AccountError::CodeExpired => {
                AppError::Validation("Verification code expired".to_string())
            }
            AccountError::Unavailable(msg) => {
                AppError::Internal(anyhow::anyhow!("account store unavailable: {msg}"))
            }
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(msg) => AppError::Validation(msg),
            OrderError::NotFound => AppError::NotFound("Order not found".to_string()),
            OrderError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            OrderError::Unavailable(msg) => {
                AppError::Internal(anyhow::anyhow!("order store unavailable: {msg}"))
            }
        }
    }
}

impl From<crate::payment::PaymentError> for AppError {
    fn from(err: crate::payment::PaymentError) -> Self {
        use crate::payment::PaymentError;
        match err {
            PaymentError::Rejected(msg) => AppError::Validation(msg),
            PaymentError::Unavailable(msg) => {
                AppError::Internal(anyhow::anyhow!("payment processor unavailable: {msg}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION"),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT"),
            AppError::RateLimitExceeded(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, msg, "RATE_LIMIT_EXCEEDED")
            }
            AppError::Internal(cause) => {
                // The cause stays in the server log; the client gets nothing.
                tracing::error!(error = %cause, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_error_mapping() {
        assert!(matches!(
            AppError::from(AccountError::Conflict("x".to_string())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(AccountError::InvalidCredentials),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            AppError::from(AccountError::AlreadyVerified),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(AccountError::Unavailable("down".to_string())),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_order_error_mapping() {
        let err = OrderError::InvalidTransition {
            from: "Pending".to_string(),
            to: "Completed".to_string(),
        };
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
        assert!(matches!(
            AppError::from(OrderError::NotFound),
            AppError::NotFound(_)
        ));
    }
}
