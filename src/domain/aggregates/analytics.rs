//! Visitor and dashboard records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Visit {
    pub id: Uuid,
    pub identity_key: Option<String>,
    pub path: String,
    pub visited_at: DateTime<Utc>,
}

impl Visit {
    pub fn new(identity_key: Option<String>, path: impl Into<String>) -> Self {
        Self { id: Uuid::now_v7(), identity_key, path: path.into(), visited_at: Utc::now() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DashboardItem {
    pub id: Uuid,
    pub title: String,
    pub value: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct DashboardItemInput {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl DashboardItem {
    pub fn create(input: DashboardItemInput) -> Self {
        Self { id: Uuid::now_v7(), title: input.title, value: Json(input.value), created_at: Utc::now() }
    }
}
