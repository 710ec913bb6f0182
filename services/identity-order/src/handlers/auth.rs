//! Registration, login, and email verification

use crate::auth::hash_password_blocking;
use crate::error::AppError;
use crate::models::{
    AccountResponse, AppJson, LoginRequest, LoginResponse, RegisterRequest, VerifyEmailRequest,
};
use crate::state::AppState;
use crate::verification::VerificationManager;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use types::account::{
    Account, normalize_email, normalize_handle, validate_campus_email, validate_handle,
};

pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    if payload.password.is_empty() || payload.full_name.trim().is_empty() {
        return Err(AppError::Validation(
            "All fields are required: username, password, csufEmail, fullName".to_string(),
        ));
    }

    validate_campus_email(&payload.csuf_email, &state.config.email_domain)?;
    let handle = normalize_handle(&payload.username);
    validate_handle(&handle)?;
    let email = normalize_email(&payload.csuf_email);

    let password_hash = hash_password_blocking(payload.password).await?;
    let code = VerificationManager::generate_code();
    let account = Account::new(
        email,
        handle,
        payload.full_name.trim().to_string(),
        password_hash,
        code,
        Utc::now(),
    );

    state.credentials.put_new(account.clone()).await?;

    // Best-effort delivery; a mail outage never fails registration.
    state.verification.issue(&account).await;

    tracing::info!(user_id = %account.id, "registered new account");
    Ok((StatusCode::CREATED, Json(account.into())))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.identifier.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Identifier and password required".to_string(),
        ));
    }

    let key = format!("login:{}", payload.identifier.trim().to_lowercase());
    state.rate_limiter.check(&key, 10, 0.2)?;

    let (account, token) = state
        .sessions
        .login(
            state.credentials.as_ref(),
            payload.identifier.trim(),
            &payload.password,
        )
        .await?;

    tracing::info!(user_id = %account.id, "login succeeded");
    Ok(Json(LoginResponse {
        user: account.into(),
        token,
    }))
}

pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyEmailRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    if payload.csuf_email.trim().is_empty() || payload.code.trim().is_empty() {
        return Err(AppError::Validation(
            "Code and csufEmail required".to_string(),
        ));
    }

    let key = format!("verify:{}", normalize_email(&payload.csuf_email));
    state.rate_limiter.check(&key, 10, 0.1)?;

    let account = state
        .verification
        .consume(&payload.csuf_email, payload.code.trim())
        .await?;

    tracing::info!(user_id = %account.id, "email verified");
    Ok(Json(account.into()))
}
