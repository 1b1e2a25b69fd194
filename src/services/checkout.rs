//! Checkout sessions and the payment-succeeded webhook.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::{Checkout, OrderDraft};
use crate::identity::Identity;
use crate::payments::PaymentProvider;
use crate::services::orders::OrderService;
use crate::store::Store;
use crate::{EcommerceError, Result};

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PaymentIntentRequest {
    #[validate(range(min = 1))]
    pub amount: i64,
    pub currency: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentIntentResponse {
    pub session_id: String,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1))]
    pub session_id: String,
    #[validate(range(min = 0))]
    pub amount: i64,
    pub currency: Option<String>,
    pub identity_key: Option<String>,
}

/// Webhook payload sent once the provider confirms the payment.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PaymentSucceeded {
    #[validate(length(min = 1))]
    pub session_id: String,
    pub identity_key: Option<String>,
    pub order: OrderDraft,
}

#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn Store>,
    payments: Arc<dyn PaymentProvider>,
    orders: OrderService,
    currency: String,
}

impl fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutService").field("payments", &self.payments).field("currency", &self.currency).finish()
    }
}

impl CheckoutService {
    pub fn new(store: Arc<dyn Store>, payments: Arc<dyn PaymentProvider>, orders: OrderService, currency: impl Into<String>) -> Self {
        Self { store, payments, orders, currency: currency.into() }
    }

    fn currency_or_default(&self, currency: Option<String>) -> String {
        currency.map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty()).unwrap_or_else(|| self.currency.clone())
    }

    /// Opens a provider intent and records a pending checkout under its id.
    #[instrument(skip(self, caller, req), fields(amount = req.amount))]
    pub async fn create_payment_intent(&self, caller: Option<&Identity>, req: PaymentIntentRequest) -> Result<PaymentIntentResponse> {
        req.validate()?;
        let currency = self.currency_or_default(req.currency);
        let intent = self.payments.create_payment_intent(req.amount, &currency).await?;

        let checkout = Checkout::open(intent.id.clone(), intent.amount, &intent.currency, caller.map(|c| c.identity_key().to_string()));
        let mut tx = self.store.begin().await?;
        tx.insert_checkout(&checkout).await?;
        tx.commit().await?;

        Ok(PaymentIntentResponse { session_id: intent.id, client_secret: intent.client_secret, amount: intent.amount, currency: intent.currency })
    }

    /// Returns the existing checkout when the session is already known.
    #[instrument(skip(self, req), fields(session_id = %req.session_id))]
    pub async fn create_checkout(&self, req: CheckoutRequest) -> Result<Checkout> {
        req.validate()?;
        let mut tx = self.store.begin().await?;
        if let Some(existing) = tx.find_checkout(&req.session_id).await? {
            return Ok(existing);
        }
        let checkout = Checkout::open(req.session_id, req.amount, &self.currency_or_default(req.currency), req.identity_key);
        tx.insert_checkout(&checkout).await?;
        tx.commit().await?;
        Ok(checkout)
    }

    #[instrument(skip(self))]
    pub async fn mark_checkout_completed(&self, session_id: &str) -> Result<Checkout> {
        let mut tx = self.store.begin().await?;
        let mut checkout = tx.find_checkout(session_id).await?.ok_or(EcommerceError::NotFound("Checkout"))?;
        if checkout.complete() {
            tx.update_checkout(&checkout).await?;
            tx.commit().await?;
            tracing::info!(session_id, "checkout completed");
        }
        Ok(checkout)
    }

    pub async fn get_checkout(&self, session_id: &str) -> Result<Checkout> {
        let mut tx = self.store.begin().await?;
        tx.find_checkout(session_id).await?.ok_or(EcommerceError::NotFound("Checkout"))
    }

    /// Completes the checkout and places its order. Safe to redeliver.
    #[instrument(skip(self, event), fields(session_id = %event.session_id))]
    pub async fn payment_succeeded(&self, event: PaymentSucceeded) -> Result<Uuid> {
        event.validate()?;
        event.order.check()?;
        match self.mark_checkout_completed(&event.session_id).await {
            Ok(_) => {}
            Err(EcommerceError::NotFound(_)) => tracing::warn!("payment succeeded for unknown checkout session"),
            Err(e) => return Err(e),
        }
        self.orders.create_order_internal(event.identity_key, event.session_id, event.order).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::tests::draft;
    use crate::domain::aggregates::CheckoutStatus;
    use crate::identity::{AdminGate, EmailAllowlist};
    use crate::messaging::EventPublisher;
    use crate::payments::MockPaymentProvider;
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn service(store: &MemoryStore) -> CheckoutService {
        let store: Arc<dyn Store> = Arc::new(store.clone());
        let gate = AdminGate::new(Arc::new(EmailAllowlist::default()));
        let orders = OrderService::new(store.clone(), gate, EventPublisher::disabled());
        let payments = Arc::new(MockPaymentProvider::new("acct_test").with_latency(Duration::ZERO));
        CheckoutService::new(store, payments, orders, "USD")
    }

    #[tokio::test]
    async fn test_payment_intent_opens_pending_checkout() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let caller = Identity::new("user_1", None);
        let resp = svc.create_payment_intent(Some(&caller), PaymentIntentRequest { amount: 4200, currency: None }).await.unwrap();
        assert_eq!(resp.currency, "USD");

        let checkout = svc.get_checkout(&resp.session_id).await.unwrap();
        assert_eq!(checkout.status, CheckoutStatus::Pending);
        assert_eq!(checkout.amount, 4200);
        assert_eq!(checkout.identity_key.as_deref(), Some("user_1"));
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected() {
        let svc = service(&MemoryStore::new());
        let err = svc.create_payment_intent(None, PaymentIntentRequest { amount: 0, currency: None }).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_checkout_is_idempotent() {
        let svc = service(&MemoryStore::new());
        let req = |amount| CheckoutRequest { session_id: "cs_1".into(), amount, currency: Some("ngn".into()), identity_key: None };
        let first = svc.create_checkout(req(100)).await.unwrap();
        let second = svc.create_checkout(req(999)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.currency, "NGN");
    }

    #[tokio::test]
    async fn test_mark_completed() {
        let svc = service(&MemoryStore::new());
        assert!(matches!(svc.mark_checkout_completed("missing").await, Err(EcommerceError::NotFound("Checkout"))));
        svc.create_checkout(CheckoutRequest { session_id: "cs_2".into(), amount: 5, currency: None, identity_key: None }).await.unwrap();
        let done = svc.mark_checkout_completed("cs_2").await.unwrap();
        assert_eq!(done.status, CheckoutStatus::Completed);
        let again = svc.mark_checkout_completed("cs_2").await.unwrap();
        assert_eq!(again.completed_at, done.completed_at);
    }

    #[tokio::test]
    async fn test_redelivered_webhook_places_one_order() {
        let store = MemoryStore::new();
        let svc = service(&store);
        svc.create_checkout(CheckoutRequest { session_id: "abc".into(), amount: 3000, currency: None, identity_key: None }).await.unwrap();
        let event = PaymentSucceeded { session_id: "abc".into(), identity_key: Some("user_1".into()), order: draft("Jane Doe", "jane@x.com") };

        let first = svc.payment_succeeded(event.clone()).await.unwrap();
        let second = svc.payment_succeeded(event).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(svc.get_checkout("abc").await.unwrap().status, CheckoutStatus::Completed);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.list_orders().await.unwrap().len(), 1);
        assert_eq!(tx.list_customers().await.unwrap().len(), 1);
    }
}
