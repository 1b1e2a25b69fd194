//! Domain events
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::OrderStatus;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Product(ProductEvent),
    Sale(SaleEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: Uuid, customer_id: Uuid, guest: bool },
    StatusChanged { order_id: Uuid, status: OrderStatus },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProductEvent {
    StockAdjusted { product_id: Uuid, before: u64, after: u64 },
    Depleted { product_id: Uuid },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SaleEvent {
    Recorded { sale_id: Uuid, amount: i64 },
}

impl DomainEvent {
    /// Messaging subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Created { .. }) => "storefront.orders.created",
            Self::Order(OrderEvent::StatusChanged { .. }) => "storefront.orders.status_changed",
            Self::Product(ProductEvent::StockAdjusted { .. }) => "storefront.products.stock_adjusted",
            Self::Product(ProductEvent::Depleted { .. }) => "storefront.products.depleted",
            Self::Sale(SaleEvent::Recorded { .. }) => "storefront.sales.recorded",
        }
    }
}
