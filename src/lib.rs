//! OpenSASE Storefront
//!
//! Self-hosted storefront and admin backend.
//!
//! ## Features
//! - Order intake with idempotent webhook delivery
//! - Customer reconciliation by caller identity
//! - Inventory adjustment on confirmed sales
//! - Product catalog management
//! - Admin analytics dashboard

pub mod config;
pub mod domain;
pub mod http;
pub mod identity;
pub mod messaging;
pub mod payments;
pub mod services;
pub mod store;

use thiserror::Error;

pub use config::AppConfig;
pub use http::{router, AppState};
pub use identity::{AdminGate, AdminPolicy, EmailAllowlist, Identity};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Multiple customers share identity key {0}")]
    DuplicateCustomer(String),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, EcommerceError>;
