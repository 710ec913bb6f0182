use identity_order::config::Config;
use identity_order::email::{Mailer, NoopMailer, SmtpMailer};
use identity_order::payment::{HttpPaymentProcessor, PaymentProcessor};
use identity_order::router::create_router;
use identity_order::state::AppState;
use identity_order::store::{CredentialStore, MemoryCredentialStore, MemoryOrderStore, OrderStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting identity & order service");

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr;

    let credentials: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
    let orders: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());
    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => {
            tracing::warn!("SMTP not configured; verification codes will not be delivered");
            Arc::new(NoopMailer)
        }
    };
    let payments: Arc<dyn PaymentProcessor> =
        Arc::new(HttpPaymentProcessor::new(config.payment_url.clone())?);

    let state = AppState::new(config, credentials, orders, mailer, payments);

    // Stale rate-limit buckets are swept in the background so the map
    // stays bounded under a churn of one-shot identifiers.
    let limiter = Arc::clone(&state.rate_limiter);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(600));
        loop {
            ticker.tick().await;
            limiter.sweep(Duration::from_secs(3600));
        }
    });

    let app = create_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
