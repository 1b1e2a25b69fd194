//! Admin-entered sales ledger.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;
use crate::domain::aggregates::{Sale, SaleDraft};
use crate::domain::events::{DomainEvent, SaleEvent};
use crate::identity::{AdminGate, Identity};
use crate::messaging::EventPublisher;
use crate::services::inventory::{InventoryReport, InventoryService, InventoryWriteMode};
use crate::store::Store;
use crate::Result;

#[derive(Clone, Debug, Serialize)]
pub struct RecordedSale {
    pub sale: Sale,
    pub inventory: InventoryReport,
}

#[derive(Clone)]
pub struct SalesService {
    store: Arc<dyn Store>,
    gate: AdminGate,
    inventory: InventoryService,
    events: EventPublisher,
}

impl fmt::Debug for SalesService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SalesService").field("inventory", &self.inventory).finish()
    }
}

impl SalesService {
    pub fn new(store: Arc<dyn Store>, gate: AdminGate, inventory: InventoryService, events: EventPublisher) -> Self {
        Self { store, gate, inventory, events }
    }

    /// Records the sale and takes the sold units off inventory.
    ///
    /// In atomic mode the sale row and every stock write share one
    /// transaction, so a failed line leaves no sale behind.
    #[instrument(skip(self, caller, draft), fields(lines = draft.products.len()))]
    pub async fn create_sale(&self, caller: Option<&Identity>, draft: SaleDraft) -> Result<RecordedSale> {
        self.gate.require_admin(caller)?;
        draft.check()?;
        let sale = Sale::record(draft);
        let inventory = match self.inventory.mode() {
            InventoryWriteMode::Atomic => {
                let mut tx = self.store.begin().await?;
                tx.insert_sale(&sale).await?;
                let report = self.inventory.apply_within(tx.as_mut(), &sale.products).await?;
                tx.commit().await?;
                tracing::info!(sale_id = %sale.id, amount = sale.transaction.amount, "sale recorded");
                self.inventory.publish_report(&report).await;
                report
            }
            InventoryWriteMode::PerItem => {
                let mut tx = self.store.begin().await?;
                tx.insert_sale(&sale).await?;
                tx.commit().await?;
                tracing::info!(sale_id = %sale.id, amount = sale.transaction.amount, "sale recorded");
                self.inventory.apply_sale_to_inventory(&sale.products).await?
            }
        };
        self.events.publish(DomainEvent::Sale(SaleEvent::Recorded { sale_id: sale.id, amount: sale.transaction.amount })).await;
        Ok(RecordedSale { sale, inventory })
    }

    /// Newest first by transaction date.
    #[instrument(skip(self, caller))]
    pub async fn list_sales(&self, caller: Option<&Identity>) -> Result<Vec<Sale>> {
        self.gate.require_admin(caller)?;
        let mut sales = self.store.begin().await?.list_sales().await?;
        sales.sort_by(|a, b| b.transaction.date.cmp(&a.transaction.date).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(sales)
    }
}
