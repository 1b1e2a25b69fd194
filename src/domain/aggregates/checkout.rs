//! Checkout Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "checkout_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStatus { #[default] Pending, Completed }

/// In-flight payment session, kept after completion as an audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Checkout {
    pub id: Uuid,
    pub session_id: String,
    pub status: CheckoutStatus,
    pub amount: i64,
    pub currency: String,
    pub identity_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Checkout {
    pub fn open(session_id: impl Into<String>, amount: i64, currency: &str, identity_key: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(), session_id: session_id.into(), status: CheckoutStatus::Pending,
            amount, currency: currency.to_string(), identity_key, created_at: Utc::now(), completed_at: None,
        }
    }

    /// Returns false when the checkout was already completed.
    pub fn complete(&mut self) -> bool {
        if self.status == CheckoutStatus::Completed { return false; }
        self.status = CheckoutStatus::Completed;
        self.completed_at = Some(Utc::now());
        true
    }
}
