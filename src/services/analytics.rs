//! Visitor tracking and the admin dashboard.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::{DashboardItem, DashboardItemInput, Order, Sale, Visit};
use crate::identity::{AdminGate, Identity};
use crate::store::Store;
use crate::{EcommerceError, Result};

const TOP_PRODUCTS: usize = 5;
const RECENT_ORDERS: usize = 5;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VisitorCount {
    pub total_visits: usize,
    pub unique_visitors: usize,
    pub anonymous_visits: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue { pub month: String, pub revenue: i64 }

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DailyVisitors { pub date: NaiveDate, pub visits: usize }

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TopProduct { pub product_id: Uuid, pub name: String, pub units: u64 }

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardData {
    pub total_revenue: i64,
    pub order_count: usize,
    pub sale_count: usize,
    pub customer_count: usize,
    pub product_count: usize,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub daily_visitors: Vec<DailyVisitors>,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<Order>,
    pub items: Vec<DashboardItem>,
}

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn Store>,
    gate: AdminGate,
}

impl fmt::Debug for AnalyticsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsService").field("store", &self.store).finish()
    }
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn Store>, gate: AdminGate) -> Self { Self { store, gate } }

    /// Anonymous visits are recorded without an identity key.
    #[instrument(skip(self, caller))]
    pub async fn track_visit(&self, caller: Option<&Identity>, path: &str) -> Result<Uuid> {
        let path = path.trim();
        if path.is_empty() {
            return Err(EcommerceError::InvalidInput("visit path is empty".to_string()));
        }
        let visit = Visit::new(caller.map(|c| c.identity_key().to_string()), path);
        let mut tx = self.store.begin().await?;
        tx.insert_visit(&visit).await?;
        tx.commit().await?;
        Ok(visit.id)
    }

    #[instrument(skip(self, caller))]
    pub async fn visitor_count(&self, caller: Option<&Identity>) -> Result<VisitorCount> {
        self.gate.require_admin(caller)?;
        let visits = self.store.begin().await?.list_visits().await?;
        Ok(count_visitors(&visits))
    }

    #[instrument(skip(self, caller))]
    pub async fn dashboard_data(&self, caller: Option<&Identity>) -> Result<DashboardData> {
        self.gate.require_admin(caller)?;
        let mut tx = self.store.begin().await?;
        let mut orders = tx.list_orders().await?;
        let sales = tx.list_sales().await?;
        let customer_count = tx.list_customers().await?.len();
        let product_count = tx.list_products().await?.len();
        let visits = tx.list_visits().await?;
        let mut items = tx.list_dashboard_items().await?;
        drop(tx);

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let live: Vec<&Order> = orders.iter().filter(|o| !o.is_cancelled()).collect();

        Ok(DashboardData {
            total_revenue: live.iter().map(|o| o.total_price).sum::<i64>() + sales.iter().map(|s| s.transaction.amount).sum::<i64>(),
            order_count: orders.len(),
            sale_count: sales.len(),
            customer_count,
            product_count,
            monthly_revenue: monthly_revenue(&live, &sales),
            daily_visitors: daily_visitors(&visits),
            top_products: top_products(&live, &sales),
            recent_orders: orders.iter().take(RECENT_ORDERS).cloned().collect(),
            items,
        })
    }

    #[instrument(skip(self, caller, input), fields(title = %input.title))]
    pub async fn add_dashboard_item(&self, caller: Option<&Identity>, input: DashboardItemInput) -> Result<DashboardItem> {
        self.gate.require_admin(caller)?;
        input.validate()?;
        let item = DashboardItem::create(input);
        let mut tx = self.store.begin().await?;
        tx.insert_dashboard_item(&item).await?;
        tx.commit().await?;
        Ok(item)
    }
}

fn count_visitors(visits: &[Visit]) -> VisitorCount {
    let identified: HashSet<&str> = visits.iter().filter_map(|v| v.identity_key.as_deref()).collect();
    VisitorCount {
        total_visits: visits.len(),
        unique_visitors: identified.len(),
        anonymous_visits: visits.iter().filter(|v| v.identity_key.is_none()).count(),
    }
}

fn month_key(at: DateTime<Utc>) -> String { at.format("%Y-%m").to_string() }

fn monthly_revenue(orders: &[&Order], sales: &[Sale]) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<String, i64> = BTreeMap::new();
    for order in orders {
        *months.entry(month_key(order.created_at)).or_default() += order.total_price;
    }
    for sale in sales {
        *months.entry(month_key(sale.transaction.date)).or_default() += sale.transaction.amount;
    }
    months.into_iter().map(|(month, revenue)| MonthlyRevenue { month, revenue }).collect()
}

fn daily_visitors(visits: &[Visit]) -> Vec<DailyVisitors> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for visit in visits {
        *days.entry(visit.visited_at.date_naive()).or_default() += 1;
    }
    days.into_iter().map(|(date, visits)| DailyVisitors { date, visits }).collect()
}

fn top_products(orders: &[&Order], sales: &[Sale]) -> Vec<TopProduct> {
    let mut units: HashMap<Uuid, TopProduct> = HashMap::new();
    let sold = orders.iter().flat_map(|o| o.items.iter().map(|i| (i.product_id, &i.name, i.quantity)))
        .chain(sales.iter().flat_map(|s| s.products.iter().map(|p| (p.product_id, &p.name, p.quantity))));
    for (product_id, name, quantity) in sold {
        units.entry(product_id)
            .or_insert_with(|| TopProduct { product_id, name: name.clone(), units: 0 })
            .units += u64::from(quantity);
    }
    let mut ranked: Vec<TopProduct> = units.into_values().collect();
    ranked.sort_by(|a, b| b.units.cmp(&a.units).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(TOP_PRODUCTS);
    ranked
}
