//! External payment-processor collaborator
//!
//! This service only obtains an intent and its opaque client secret;
//! capture and settlement happen entirely on the processor's side.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use types::ids::OrderId;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment processor rejected the request: {0}")]
    Rejected(String),

    #[error("payment processor unavailable: {0}")]
    Unavailable(String),
}

/// An intent created by the external processor
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_intent(
        &self,
        amount: Decimal,
        order_id: &OrderId,
    ) -> Result<PaymentIntent, PaymentError>;
}

/// HTTP client for the processor, with a bounded timeout so an outage
/// surfaces as an error instead of a hang.
pub struct HttpPaymentProcessor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentProcessor {
    /// Fails if the underlying client cannot be built; a client
    /// without the timeout would hang on a processor outage.
    pub fn new(base_url: String) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PaymentError::Unavailable(format!("failed to build http client: {e}")))?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl PaymentProcessor for HttpPaymentProcessor {
    async fn create_intent(
        &self,
        amount: Decimal,
        order_id: &OrderId,
    ) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .post(format!("{}/intents", self.base_url))
            .json(&json!({
                "amount": amount,
                "orderId": order_id,
            }))
            .send()
            .await
            .map_err(|e| PaymentError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Rejected(format!(
                "processor returned {}",
                response.status()
            )));
        }

        response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| PaymentError::Unavailable(format!("invalid processor response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_construction_carries_timeout() {
        // Construction must surface builder failures rather than fall
        // back to an unbounded client.
        assert!(HttpPaymentProcessor::new("http://localhost:8081".to_string()).is_ok());
    }
}
