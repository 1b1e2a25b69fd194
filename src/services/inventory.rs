//! Inventory adjustment on confirmed sales.
//!
//! Each sold line takes units off its product with a clamped decrement. In
//! `PerItem` mode every line is its own transaction, so one bad product does
//! not hold back the rest. `Atomic` mode applies the whole sale or nothing.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use crate::domain::aggregates::{SaleLineItem, StockAdjustment};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::messaging::EventPublisher;
use crate::store::{Store, StoreTx};
use crate::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InventoryWriteMode {
    #[default]
    PerItem,
    Atomic,
}

impl FromStr for InventoryWriteMode {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "per_item" | "per-item" => Ok(Self::PerItem),
            "atomic" => Ok(Self::Atomic),
            other => Err(format!("unknown inventory write mode '{}'", other)),
        }
    }
}

/// Whether concurrent sales of one product wait for each other.
///
/// `None` reads and writes stock without a row lock, so two overlapping sales
/// can both start from the same level and under-decrement. `Serialize` locks
/// the product row for the duration of the write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StockLocking {
    #[default]
    None,
    Serialize,
}

impl FromStr for StockLocking {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "serialize" | "row_lock" => Ok(Self::Serialize),
            other => Err(format!("unknown stock locking policy '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LineOutcome {
    Adjusted(StockAdjustment),
    /// Unlimited-stock products are never decremented.
    Unlimited,
    /// The product no longer exists.
    Skipped,
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LineReport {
    pub product_id: Uuid,
    pub quantity: u32,
    #[serde(flatten)]
    pub outcome: LineOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InventoryReport {
    pub lines: Vec<LineReport>,
}

impl InventoryReport {
    pub fn failed(&self) -> usize { self.lines.iter().filter(|l| matches!(l.outcome, LineOutcome::Failed { .. })).count() }
    pub fn depleted(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.lines.iter().filter_map(|l| match l.outcome {
            LineOutcome::Adjusted(adj) if adj.depleted => Some(l.product_id),
            _ => None,
        })
    }
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn Store>,
    events: EventPublisher,
    mode: InventoryWriteMode,
    locking: StockLocking,
}

impl fmt::Debug for InventoryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryService").field("mode", &self.mode).field("locking", &self.locking).finish()
    }
}

impl InventoryService {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher, mode: InventoryWriteMode, locking: StockLocking) -> Self {
        Self { store, events, mode, locking }
    }

    pub fn mode(&self) -> InventoryWriteMode { self.mode }

    #[instrument(skip(self, items), fields(lines = items.len(), mode = ?self.mode))]
    pub async fn apply_sale_to_inventory(&self, items: &[SaleLineItem]) -> Result<InventoryReport> {
        let report = match self.mode {
            InventoryWriteMode::PerItem => self.apply_per_item(items).await,
            InventoryWriteMode::Atomic => {
                let mut tx = self.store.begin().await?;
                let report = self.apply_within(tx.as_mut(), items).await?;
                tx.commit().await?;
                report
            }
        };
        self.publish_report(&report).await;
        Ok(report)
    }

    /// Adjusts every line inside the caller's transaction. The first failure
    /// aborts; nothing is committed here.
    pub async fn apply_within(&self, tx: &mut dyn StoreTx, items: &[SaleLineItem]) -> Result<InventoryReport> {
        let mut report = InventoryReport::default();
        for item in items {
            let outcome = self.adjust(tx, item).await?;
            report.lines.push(LineReport { product_id: item.product_id, quantity: item.quantity, outcome });
        }
        Ok(report)
    }

    async fn apply_per_item(&self, items: &[SaleLineItem]) -> InventoryReport {
        let mut report = InventoryReport::default();
        for item in items {
            let outcome = match self.adjust_in_own_tx(item).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(product_id = %item.product_id, error = %e, "inventory adjustment failed");
                    LineOutcome::Failed { reason: e.to_string() }
                }
            };
            report.lines.push(LineReport { product_id: item.product_id, quantity: item.quantity, outcome });
        }
        if report.failed() > 0 {
            tracing::warn!(failed = report.failed(), "some inventory lines were not adjusted");
        }
        report
    }

    async fn adjust_in_own_tx(&self, item: &SaleLineItem) -> Result<LineOutcome> {
        let mut tx = self.store.begin().await?;
        let outcome = self.adjust(tx.as_mut(), item).await?;
        if matches!(outcome, LineOutcome::Adjusted(_)) { tx.commit().await?; }
        Ok(outcome)
    }

    async fn adjust(&self, tx: &mut dyn StoreTx, item: &SaleLineItem) -> Result<LineOutcome> {
        let product = match self.locking {
            StockLocking::None => tx.get_product(item.product_id).await?,
            StockLocking::Serialize => tx.lock_product(item.product_id).await?,
        };
        let Some(mut product) = product else {
            tracing::debug!(product_id = %item.product_id, "sold product no longer exists; skipping");
            return Ok(LineOutcome::Skipped);
        };
        if product.unlimited_stock { return Ok(LineOutcome::Unlimited); }
        let adjustment = product.remove_sold(item.quantity);
        tx.update_product(&product).await?;
        Ok(LineOutcome::Adjusted(adjustment))
    }

    /// Emits stock events for a committed report.
    pub async fn publish_report(&self, report: &InventoryReport) {
        let adjusted = report.lines.iter().filter_map(|line| match line.outcome {
            LineOutcome::Adjusted(adj) => Some(DomainEvent::Product(ProductEvent::StockAdjusted { product_id: line.product_id, before: adj.before, after: adj.after })),
            _ => None,
        });
        let depleted = report.depleted().map(|product_id| DomainEvent::Product(ProductEvent::Depleted { product_id }));
        self.events.publish_all(adjusted.chain(depleted).collect::<Vec<_>>()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::input;
    use crate::domain::aggregates::{Product, ProductInput, StockStatus};
    use crate::store::MemoryStore;

    async fn seed(store: &MemoryStore, product: Product) -> Uuid {
        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&product).await.unwrap();
        tx.commit().await.unwrap();
        product.id
    }

    async fn load(store: &MemoryStore, id: Uuid) -> Option<Product> {
        store.begin().await.unwrap().get_product(id).await.unwrap()
    }

    fn line(product_id: Uuid, quantity: u32) -> SaleLineItem {
        SaleLineItem { product_id, name: "Item".into(), quantity, price: 100 }
    }

    fn service(store: &MemoryStore, mode: InventoryWriteMode) -> InventoryService {
        InventoryService::new(Arc::new(store.clone()), EventPublisher::disabled(), mode, StockLocking::None)
    }

    #[tokio::test]
    async fn test_oversell_clamps_to_zero() {
        let store = MemoryStore::new();
        let id = seed(&store, Product::create(input("Mug", "5")).unwrap()).await;
        let report = service(&store, InventoryWriteMode::PerItem).apply_sale_to_inventory(&[line(id, 7)]).await.unwrap();

        let product = load(&store, id).await.unwrap();
        assert_eq!(product.stock_quantity, "0");
        assert_eq!(product.stock_status, StockStatus::OutOfStock);
        assert_eq!(report.depleted().collect::<Vec<_>>(), vec![id]);
    }

    #[tokio::test]
    async fn test_sequence_of_sales_matches_clamped_sum() {
        for (initial, sales) in [(10u64, vec![3u32, 4]), (10, vec![3, 4, 3]), (4, vec![1, 1, 9, 2]), (0, vec![1]), (7, vec![])] {
            let store = MemoryStore::new();
            let id = seed(&store, Product::create(input("Mug", &initial.to_string())).unwrap()).await;
            let svc = service(&store, InventoryWriteMode::PerItem);
            for q in &sales {
                svc.apply_sale_to_inventory(&[line(id, *q)]).await.unwrap();
            }
            let expected = initial.saturating_sub(sales.iter().map(|q| u64::from(*q)).sum());
            let product = load(&store, id).await.unwrap();
            assert_eq!(product.stock_quantity, expected.to_string());
            assert_eq!(product.stock_status == StockStatus::OutOfStock, expected == 0, "initial {} sales {:?}", initial, sales);
        }
    }

    #[tokio::test]
    async fn test_status_untouched_above_zero() {
        let store = MemoryStore::new();
        let mut product = Product::create(input("Mug", "5")).unwrap();
        product.stock_status = StockStatus::OutOfStock;
        let id = seed(&store, product).await;
        service(&store, InventoryWriteMode::PerItem).apply_sale_to_inventory(&[line(id, 1)]).await.unwrap();
        let product = load(&store, id).await.unwrap();
        assert_eq!(product.stock_quantity, "4");
        assert_eq!(product.stock_status, StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_unparseable_stock_reads_as_zero() {
        let store = MemoryStore::new();
        let mut product = Product::create(input("Mug", "5")).unwrap();
        product.stock_quantity = "n/a".into();
        let id = seed(&store, product).await;
        service(&store, InventoryWriteMode::PerItem).apply_sale_to_inventory(&[line(id, 2)]).await.unwrap();
        let product = load(&store, id).await.unwrap();
        assert_eq!(product.stock_quantity, "0");
        assert_eq!(product.stock_status, StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_missing_product_is_skipped() {
        let store = MemoryStore::new();
        let id = seed(&store, Product::create(input("Mug", "5")).unwrap()).await;
        let ghost = Uuid::now_v7();
        let report = service(&store, InventoryWriteMode::PerItem)
            .apply_sale_to_inventory(&[line(ghost, 1), line(id, 2)]).await.unwrap();
        assert_eq!(report.lines[0].outcome, LineOutcome::Skipped);
        assert_eq!(load(&store, id).await.unwrap().stock_quantity, "3");
    }

    #[tokio::test]
    async fn test_unlimited_stock_is_not_decremented() {
        let store = MemoryStore::new();
        let id = seed(&store, Product::create(ProductInput { unlimited_stock: true, ..input("Ebook", "0") }).unwrap()).await;
        let report = service(&store, InventoryWriteMode::PerItem).apply_sale_to_inventory(&[line(id, 3)]).await.unwrap();
        assert_eq!(report.lines[0].outcome, LineOutcome::Unlimited);
        assert_eq!(load(&store, id).await.unwrap().stock_status, StockStatus::InStock);
    }

    #[tokio::test]
    async fn test_per_item_failure_does_not_block_other_lines() {
        let store = MemoryStore::new();
        let broken = seed(&store, Product::create(input("Broken", "5")).unwrap()).await;
        let healthy = seed(&store, Product::create(input("Healthy", "5")).unwrap()).await;
        store.reject_product_writes(broken).await;

        let report = service(&store, InventoryWriteMode::PerItem)
            .apply_sale_to_inventory(&[line(broken, 1), line(healthy, 2)]).await.unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(load(&store, broken).await.unwrap().stock_quantity, "5");
        assert_eq!(load(&store, healthy).await.unwrap().stock_quantity, "3");
    }

    #[tokio::test]
    async fn test_atomic_failure_rolls_back_every_line() {
        let store = MemoryStore::new();
        let healthy = seed(&store, Product::create(input("Healthy", "5")).unwrap()).await;
        let broken = seed(&store, Product::create(input("Broken", "5")).unwrap()).await;
        store.reject_product_writes(broken).await;

        let result = service(&store, InventoryWriteMode::Atomic)
            .apply_sale_to_inventory(&[line(healthy, 2), line(broken, 1)]).await;
        assert!(result.is_err());
        assert_eq!(load(&store, healthy).await.unwrap().stock_quantity, "5");
    }

    #[tokio::test]
    async fn test_serialized_locking_applies_same_clamp() {
        let store = MemoryStore::new();
        let id = seed(&store, Product::create(input("Mug", "6")).unwrap()).await;
        let svc = InventoryService::new(Arc::new(store.clone()), EventPublisher::disabled(), InventoryWriteMode::Atomic, StockLocking::Serialize);
        svc.apply_sale_to_inventory(&[line(id, 4)]).await.unwrap();
        assert_eq!(load(&store, id).await.unwrap().stock_quantity, "2");
        let report = svc.apply_sale_to_inventory(&[line(id, 4), line(Uuid::now_v7(), 1)]).await.unwrap();
        assert_eq!(report.lines[1].outcome, LineOutcome::Skipped);
        let product = load(&store, id).await.unwrap();
        assert_eq!(product.stock_quantity, "0");
        assert_eq!(product.stock_status, StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_concurrent_serialized_sales_sum() {
        let store = MemoryStore::new();
        let id = seed(&store, Product::create(input("Mug", "10")).unwrap()).await;
        let svc = InventoryService::new(Arc::new(store.clone()), EventPublisher::disabled(), InventoryWriteMode::PerItem, StockLocking::Serialize);
        let sales: Vec<_> = (0..3).map(|_| {
            let svc = svc.clone();
            tokio::spawn(async move { svc.apply_sale_to_inventory(&[line(id, 3)]).await })
        }).collect();
        for sale in sales {
            sale.await.unwrap().unwrap();
        }
        assert_eq!(load(&store, id).await.unwrap().stock_quantity, "1");
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("ATOMIC".parse::<InventoryWriteMode>().unwrap(), InventoryWriteMode::Atomic);
        assert_eq!("per-item".parse::<InventoryWriteMode>().unwrap(), InventoryWriteMode::PerItem);
        assert!("nope".parse::<StockLocking>().is_err());
    }
}
