//! Application services
//!
//! Each service owns one area of the storefront and runs every public call
//! in a single store transaction. A service never opens a second transaction
//! while one is still held.

pub mod analytics;
pub mod catalog;
pub mod checkout;
pub mod customers;
pub mod inventory;
pub mod orders;
pub mod sales;
pub mod users;

use std::sync::Arc;
use crate::config::AppConfig;
use crate::identity::AdminGate;
use crate::messaging::EventPublisher;
use crate::payments::PaymentProvider;
use crate::store::Store;

pub use analytics::AnalyticsService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use customers::{upsert_customer_for_order, CustomerUpsert};
pub use inventory::{InventoryService, InventoryWriteMode, StockLocking};
pub use orders::OrderService;
pub use sales::SalesService;
pub use users::UserService;

/// Every service, wired to one store.
#[derive(Clone, Debug)]
pub struct Services {
    pub orders: OrderService,
    pub catalog: CatalogService,
    pub checkout: CheckoutService,
    pub sales: SalesService,
    pub users: UserService,
    pub analytics: AnalyticsService,
}

impl Services {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn Store>,
        gate: AdminGate,
        payments: Arc<dyn PaymentProvider>,
        events: EventPublisher,
    ) -> Self {
        let orders = OrderService::new(store.clone(), gate.clone(), events.clone());
        let inventory = InventoryService::new(store.clone(), events.clone(), config.inventory_write_mode, config.stock_locking);
        Self {
            checkout: CheckoutService::new(store.clone(), payments, orders.clone(), config.currency.clone()),
            sales: SalesService::new(store.clone(), gate.clone(), inventory, events),
            catalog: CatalogService::new(store.clone(), gate.clone()),
            users: UserService::new(store.clone()),
            analytics: AnalyticsService::new(store, gate),
            orders,
        }
    }
}
