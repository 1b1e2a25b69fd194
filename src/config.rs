//! Environment-driven configuration.

use std::env;
use std::str::FromStr;
use crate::services::inventory::{InventoryWriteMode, StockLocking};
use crate::{EcommerceError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Without a database URL the service runs on the in-process store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub nats_url: Option<String>,
    pub admin_emails: Vec<String>,
    /// Shared key for webhook and automation callers. Internal routes are closed when unset.
    pub internal_api_key: Option<String>,
    pub inventory_write_mode: InventoryWriteMode,
    pub stock_locking: StockLocking,
    pub currency: String,
    pub payment_account_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8083,
            database_url: None,
            max_connections: 10,
            nats_url: None,
            admin_emails: Vec::new(),
            internal_api_key: None,
            inventory_write_mode: InventoryWriteMode::default(),
            stock_locking: StockLocking::default(),
            currency: "USD".to_string(),
            payment_account_id: "mock_main_acct".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let port = parse_var("PORT", get("PORT"), defaults.port)?;
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", get("DATABASE_MAX_CONNECTIONS"), defaults.max_connections)?;
        let inventory_write_mode = parse_var("INVENTORY_WRITE_MODE", get("INVENTORY_WRITE_MODE"), defaults.inventory_write_mode)?;
        let stock_locking = parse_var("INVENTORY_STOCK_LOCKING", get("INVENTORY_STOCK_LOCKING"), defaults.stock_locking)?;
        let admin_emails = get("ADMIN_EMAILS")
            .map(|raw| raw.split(',').map(|e| e.trim().to_string()).filter(|e| !e.is_empty()).collect())
            .unwrap_or_default();

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            database_url: get("DATABASE_URL"),
            max_connections,
            nats_url: get("NATS_URL"),
            admin_emails,
            internal_api_key: get("INTERNAL_API_KEY"),
            inventory_write_mode,
            stock_locking,
            currency: get("CURRENCY").map(|c| c.to_uppercase()).unwrap_or(defaults.currency),
            payment_account_id: get("PAYMENT_ACCOUNT_ID").unwrap_or(defaults.payment_account_id),
        })
    }

    pub fn bind_address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => raw.parse().map_err(|_| EcommerceError::Config(format!("invalid {}: '{}'", key, raw))),
        None => Ok(default),
    }
}
