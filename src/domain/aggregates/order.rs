//! Order Aggregate
//!
//! An order keeps its own copy of the buyer's contact details. The linked
//! [`Customer`](super::Customer) profile may change later; the snapshot here
//! does not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Processing, Completed, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed, Refunded }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LineItem {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[validate(range(min = 0))]
    pub unit_price: i64,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1))]
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    #[validate(length(min = 1))]
    pub country: String,
}

/// Contact details as they were when the order was placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CustomerSnapshot {
    #[sqlx(rename = "customer_name")]
    pub name: String,
    #[sqlx(rename = "customer_email")]
    pub email: String,
    #[sqlx(rename = "customer_phone")]
    pub phone: Option<String>,
}

impl CustomerSnapshot {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: Option<String>) -> Self {
        Self { name: name.into(), email: email.into(), phone }
    }
}

/// Checkout payload as submitted by the storefront or the payment webhook.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct OrderDraft {
    #[validate(length(min = 1))]
    pub items: Vec<LineItem>,
    #[validate(range(min = 0))]
    pub total_price: i64,
    #[validate]
    pub shipping_address: ShippingAddress,
    #[validate(length(min = 1))]
    pub payment_intent_ref: String,
    #[validate(length(min = 1))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    pub customer_phone: Option<String>,
}

impl OrderDraft {
    /// Validates the payload and every line item.
    pub fn check(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        self.items.iter().try_for_each(|item| item.validate())
    }

    pub fn contact(&self) -> CustomerSnapshot {
        CustomerSnapshot::new(self.customer_name.trim(), self.customer_email.trim(), self.customer_phone.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub identity_key: Option<String>,
    #[sqlx(flatten)]
    pub customer: CustomerSnapshot,
    pub items: Json<Vec<LineItem>>,
    pub total_price: i64,
    pub shipping_address: Json<ShippingAddress>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub session_id: Option<String>,
    pub payment_intent_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a pending, paid order from a draft. The total is taken as supplied.
    pub fn place(identity_key: Option<String>, session_id: Option<String>, draft: OrderDraft) -> Self {
        let customer = draft.contact();
        Self {
            id: Uuid::now_v7(),
            identity_key,
            customer,
            items: Json(draft.items),
            total_price: draft.total_price,
            shipping_address: Json(draft.shipping_address),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Paid,
            session_id,
            payment_intent_ref: Some(draft.payment_intent_ref),
            created_at: Utc::now(),
        }
    }

    pub fn units(&self) -> u64 { self.items.iter().map(|i| u64::from(i.quantity)).sum() }
    pub fn is_cancelled(&self) -> bool { self.status == OrderStatus::Cancelled }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn draft(name: &str, email: &str) -> OrderDraft {
        OrderDraft {
            items: vec![LineItem { product_id: Uuid::now_v7(), quantity: 2, unit_price: 1500, name: "Widget".into() }],
            total_price: 3000,
            shipping_address: ShippingAddress { line1: "1 Main St".into(), city: "Lagos".into(), country: "NG".into(), ..Default::default() },
            payment_intent_ref: "pi_123".into(),
            customer_name: name.into(),
            customer_email: email.into(),
            customer_phone: None,
        }
    }

    #[test]
    fn test_place_keeps_supplied_total() {
        let mut d = draft("Jane Doe", "jane@x.com");
        d.total_price = 1;
        let order = Order::place(None, None, d);
        assert_eq!(order.total_price, 1);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.customer.name, "Jane Doe");
        assert_eq!(order.units(), 2);
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft("Jane Doe", "jane@x.com").check().is_ok());
        assert!(draft("Jane Doe", "not-an-email").check().is_err());
        assert!(draft("", "jane@x.com").check().is_err());

        let mut d = draft("Jane Doe", "jane@x.com");
        d.items[0].quantity = 0;
        assert!(d.check().is_err());

        let mut d = draft("Jane Doe", "jane@x.com");
        d.items.clear();
        assert!(d.check().is_err());

        let mut d = draft("Jane Doe", "jane@x.com");
        d.shipping_address.city.clear();
        assert!(d.check().is_err());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&OrderStatus::Processing).unwrap(), "\"processing\"");
        let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }
}
