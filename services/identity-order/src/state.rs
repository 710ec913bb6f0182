use crate::auth::SessionIssuer;
use crate::config::Config;
use crate::email::Mailer;
use crate::payment::PaymentProcessor;
use crate::rate_limit::RateLimiter;
use crate::store::{CredentialStore, OrderStore};
use crate::verification::VerificationManager;
use std::sync::Arc;

/// Shared application state; everything is constructed in `main` (or a
/// test harness) and injected, never reached through globals.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub orders: Arc<dyn OrderStore>,
    pub sessions: Arc<SessionIssuer>,
    pub verification: Arc<VerificationManager>,
    pub payments: Arc<dyn PaymentProcessor>,
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        credentials: Arc<dyn CredentialStore>,
        orders: Arc<dyn OrderStore>,
        mailer: Arc<dyn Mailer>,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Self {
        let sessions = Arc::new(SessionIssuer::new(&config.jwt_secret, config.token_ttl_secs));
        let verification = Arc::new(VerificationManager::new(
            Arc::clone(&credentials),
            mailer,
            config.code_ttl_secs,
        ));
        Self {
            credentials,
            orders,
            sessions,
            verification,
            payments,
            rate_limiter: Arc::new(RateLimiter::new()),
            config: Arc::new(config),
        }
    }
}
