//! Payment provider seam.
//!
//! The storefront only needs a payment intent and its client secret; card
//! handling stays with the provider.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;
use crate::{EcommerceError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync + fmt::Debug {
    async fn create_payment_intent(&self, amount: i64, currency: &str) -> Result<PaymentIntent>;
}

/// Local stand-in that fabricates intents after a short simulated delay.
#[derive(Clone, Debug)]
pub struct MockPaymentProvider {
    account_id: String,
    latency: Duration,
}

impl MockPaymentProvider {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self { account_id: account_id.into(), latency: Duration::from_millis(50) }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    #[instrument(skip(self), fields(account_id = %self.account_id))]
    async fn create_payment_intent(&self, amount: i64, currency: &str) -> Result<PaymentIntent> {
        if amount <= 0 {
            return Err(EcommerceError::Payment("amount must be greater than zero".to_string()));
        }
        tokio::time::sleep(self.latency).await;

        let id = format!("mock_pi_{}", Uuid::new_v4().simple());
        tracing::info!(intent_id = %id, "created mock payment intent");
        Ok(PaymentIntent {
            client_secret: format!("{}_secret_{}", id, Uuid::new_v4().simple()),
            id,
            amount,
            currency: currency.to_uppercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_intent() {
        let provider = MockPaymentProvider::new("acct_test").with_latency(Duration::ZERO);
        let intent = provider.create_payment_intent(2500, "usd").await.unwrap();
        assert!(intent.id.starts_with("mock_pi_"));
        assert!(intent.client_secret.starts_with(&intent.id));
        assert_eq!(intent.currency, "USD");
    }

    #[tokio::test]
    async fn test_mock_rejects_zero_amount() {
        let provider = MockPaymentProvider::new("acct_test").with_latency(Duration::ZERO);
        assert!(matches!(provider.create_payment_intent(0, "usd").await, Err(EcommerceError::Payment(_))));
    }
}
