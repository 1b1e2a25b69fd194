//! OpenSASE Storefront - Self-hosted storefront and admin backend

use anyhow::Result;
use opensase_storefront::payments::MockPaymentProvider;
use opensase_storefront::services::Services;
use opensase_storefront::store::{MemoryStore, PgStore, Store};
use opensase_storefront::{router, AdminGate, AppConfig, AppState, EmailAllowlist};
use opensase_storefront::messaging::EventPublisher;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = AppConfig::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url, config.max_connections).await?),
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable; domain events will only be logged");
                None
            }
        },
        None => None,
    };

    let allowlist = EmailAllowlist::new(&config.admin_emails);
    if allowlist.is_empty() {
        tracing::warn!("ADMIN_EMAILS is empty; every admin operation will be forbidden");
    } else {
        tracing::info!(admins = allowlist.len(), "admin allowlist loaded");
    }
    let gate = AdminGate::new(Arc::new(allowlist));
    let payments = Arc::new(MockPaymentProvider::new(config.payment_account_id.clone()));
    let services = Services::new(&config, store, gate, payments, EventPublisher::new(nats));
    let app = router(AppState::new(services, config.internal_api_key.clone()));

    let addr = config.bind_address();
    tracing::info!("🚀 OpenSASE Storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
