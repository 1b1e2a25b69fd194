//! Sale Aggregate
//!
//! Admin-entered ledger, independent of orders and customers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SaleLineItem {
    pub product_id: Uuid,
    pub name: String,
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[validate(range(min = 0))]
    pub price: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SaleCustomer {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SaleTransaction {
    #[validate(range(min = 0))]
    pub amount: i64,
    #[validate(length(min = 1))]
    pub payment_method: String,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct SaleDraft {
    #[validate(length(min = 1))]
    pub products: Vec<SaleLineItem>,
    #[validate]
    pub customer: SaleCustomer,
    #[validate]
    pub transaction: SaleTransaction,
}

impl SaleDraft {
    pub fn check(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        self.products.iter().try_for_each(|p| p.validate())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub products: Json<Vec<SaleLineItem>>,
    pub customer: Json<SaleCustomer>,
    #[sqlx(rename = "transaction_details")]
    pub transaction: Json<SaleTransaction>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    pub fn record(draft: SaleDraft) -> Self {
        Self {
            id: Uuid::now_v7(),
            products: Json(draft.products),
            customer: Json(draft.customer),
            transaction: Json(draft.transaction),
            created_at: Utc::now(),
        }
    }
}
