//! Order intake, history and admin order management.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use crate::domain::aggregates::{Customer, CustomerSnapshot, Order, OrderDraft, OrderStatus};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::identity::{AdminGate, Identity};
use crate::messaging::EventPublisher;
use crate::services::customers::{upsert_customer_for_order, CustomerUpsert};
use crate::store::Store;
use crate::{EcommerceError, Result};

pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";

/// Contact resolved from the customer profile that owns an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedContact {
    pub customer_id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ResolvedContact {
    fn from_customer(customer: Option<&Customer>) -> Self {
        match customer {
            Some(c) => Self { customer_id: Some(c.id), name: c.display_name(), email: Some(c.email.clone()), phone: c.phone.clone() },
            None => Self { customer_id: None, name: UNKNOWN_CUSTOMER.to_string(), email: None, phone: None },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdminOrderView {
    #[serde(flatten)]
    pub order: Order,
    pub resolved_customer: ResolvedContact,
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    gate: AdminGate,
    events: EventPublisher,
}

impl fmt::Debug for OrderService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderService").field("store", &self.store).finish()
    }
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, gate: AdminGate, events: EventPublisher) -> Self {
        Self { store, gate, events }
    }

    /// Places an order for the caller, or a guest order when there is none.
    #[instrument(skip(self, caller, draft), fields(guest = caller.is_none()))]
    pub async fn create_order(&self, caller: Option<&Identity>, draft: OrderDraft) -> Result<Uuid> {
        draft.check()?;
        let identity_key = caller.map(|c| c.identity_key().to_string());
        let mut tx = self.store.begin().await?;
        let order = Order::place(identity_key, None, draft);
        tx.insert_order(&order).await?;
        let upsert = upsert_customer_for_order(tx.as_mut(), order.identity_key.as_deref(), &order.customer, order.id).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, total = order.total_price, "order created");
        self.publish_created(&order, upsert).await;
        Ok(order.id)
    }

    /// Idempotent on `session_id`: a repeated delivery returns the first
    /// order's id and writes nothing.
    #[instrument(skip(self, draft))]
    pub async fn create_order_internal(&self, identity_key: Option<String>, session_id: String, draft: OrderDraft) -> Result<Uuid> {
        draft.check()?;
        match self.place_for_session(identity_key, &session_id, draft).await {
            Err(EcommerceError::Conflict(reason)) => {
                let mut tx = self.store.begin().await?;
                match tx.find_order_by_session(&session_id).await? {
                    Some(existing) => {
                        tracing::info!(%reason, order_id = %existing.id, "lost order race for session; returning committed order");
                        Ok(existing.id)
                    }
                    None => {
                        tracing::warn!(%reason, %session_id, "unique conflict on another key; no order exists for session");
                        Err(EcommerceError::Conflict(reason))
                    }
                }
            }
            other => other,
        }
    }

    async fn place_for_session(&self, identity_key: Option<String>, session_id: &str, draft: OrderDraft) -> Result<Uuid> {
        let mut tx = self.store.begin().await?;
        if let Some(existing) = tx.find_order_by_session(session_id).await? {
            tracing::debug!(order_id = %existing.id, "order already exists for session");
            return Ok(existing.id);
        }

        let order = Order::place(identity_key, Some(session_id.to_string()), draft);
        tx.insert_order(&order).await?;

        // A brand-new profile prefers the stored identity record's contact.
        let mut contact = order.customer.clone();
        if let Some(key) = order.identity_key.as_deref() {
            if let Some(user) = tx.find_user_by_identity(key).await? {
                contact = CustomerSnapshot::new(
                    user.name.unwrap_or(contact.name),
                    user.email.unwrap_or(contact.email),
                    contact.phone,
                );
            }
        }
        let upsert = upsert_customer_for_order(tx.as_mut(), order.identity_key.as_deref(), &contact, order.id).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, session_id, "order created from checkout session");
        self.publish_created(&order, upsert).await;
        Ok(order.id)
    }

    /// Overwrites the status unconditionally. Any status may move to any other.
    #[instrument(skip(self, caller))]
    pub async fn update_order_status(&self, caller: Option<&Identity>, order_id: Uuid, status: OrderStatus) -> Result<()> {
        self.gate.require_admin(caller)?;
        let mut tx = self.store.begin().await?;
        if !tx.set_order_status(order_id, status).await? {
            return Err(EcommerceError::NotFound("Order"));
        }
        tx.commit().await?;
        self.events.publish(DomainEvent::Order(OrderEvent::StatusChanged { order_id, status })).await;
        Ok(())
    }

    /// The caller's own orders, newest first. Anonymous callers get nothing.
    #[instrument(skip(self, caller))]
    pub async fn get_user_orders(&self, caller: Option<&Identity>) -> Result<Vec<Order>> {
        let Some(caller) = caller else { return Ok(Vec::new()) };
        let mut tx = self.store.begin().await?;
        let mut orders = tx.list_orders_for_identity(caller.identity_key()).await?;
        newest_first(&mut orders);
        Ok(orders)
    }

    #[instrument(skip(self, caller))]
    pub async fn get_orders(&self, caller: Option<&Identity>) -> Result<Vec<AdminOrderView>> {
        self.gate.require_admin(caller)?;
        let mut tx = self.store.begin().await?;
        let mut orders = tx.list_orders().await?;
        let customers = tx.list_customers().await?;
        newest_first(&mut orders);

        let owner: HashMap<Uuid, &Customer> = customers.iter()
            .flat_map(|c| c.order_ids.iter().map(move |id| (*id, c)))
            .collect();
        Ok(orders.into_iter()
            .map(|order| {
                let resolved_customer = ResolvedContact::from_customer(owner.get(&order.id).copied());
                AdminOrderView { order, resolved_customer }
            })
            .collect())
    }

    async fn publish_created(&self, order: &Order, upsert: CustomerUpsert) {
        self.events.publish(DomainEvent::Order(OrderEvent::Created {
            order_id: order.id,
            customer_id: upsert.customer_id(),
            guest: order.identity_key.is_none(),
        })).await;
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}
