//! In-process store.
//!
//! A transaction holds the table lock for its whole lifetime and works on a
//! copy of the tables; commit swaps the copy in. Transactions are therefore
//! fully serialised.

use async_trait::async_trait;
use std::collections::HashMap;
#[cfg(test)]
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;
use crate::domain::aggregates::{
    Category, Checkout, Customer, DashboardItem, Order, OrderStatus, Product, Sale, Tag, UserIdentity, Visit,
};
use crate::store::{Store, StoreTx};
use crate::{EcommerceError, Result};

#[derive(Clone, Debug, Default)]
struct Tables {
    orders: HashMap<Uuid, Order>,
    customers: HashMap<Uuid, Customer>,
    users: HashMap<Uuid, UserIdentity>,
    products: HashMap<Uuid, Product>,
    categories: HashMap<Uuid, Category>,
    tags: HashMap<Uuid, Tag>,
    checkouts: HashMap<Uuid, Checkout>,
    sales: HashMap<Uuid, Sale>,
    visits: Vec<Visit>,
    dashboard_items: Vec<DashboardItem>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    #[cfg(test)]
    faults: Arc<std::sync::Mutex<Faults>>,
}

/// Injected failures. Kept outside `Tables` so a rollback does not reset them.
#[cfg(test)]
#[derive(Debug, Default)]
struct Faults {
    rejected_product_writes: HashSet<Uuid>,
    hidden_session_lookups: usize,
    customer_identity_taken: bool,
}

#[cfg(test)]
impl MemoryStore {
    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes every write to the given product fail.
    pub(crate) async fn reject_product_writes(&self, id: Uuid) {
        self.faults().rejected_product_writes.insert(id);
    }

    /// The next `n` session lookups find nothing, as if another writer had
    /// not committed yet when they ran.
    pub(crate) fn hide_next_session_lookups(&self, n: usize) {
        self.faults().hidden_session_lookups = n;
    }

    /// Customer inserts fail with the identity unique-key conflict.
    pub(crate) fn fail_customer_inserts_as_taken(&self) {
        self.faults().customer_identity_taken = true;
    }
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            #[cfg(test)]
            faults: self.faults.clone(),
        }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    #[cfg(test)]
    faults: Arc<std::sync::Mutex<Faults>>,
}

#[cfg(test)]
impl MemoryTx {
    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn conflict(what: &str, key: &str) -> EcommerceError {
    EcommerceError::Conflict(format!("{} '{}' already exists", what, key))
}

fn replace<T: Clone>(table: &mut HashMap<Uuid, T>, id: Uuid, value: &T, what: &'static str) -> Result<()> {
    match table.get_mut(&id) {
        Some(slot) => { *slot = value.clone(); Ok(()) }
        None => Err(EcommerceError::NotFound(what)),
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        if let Some(session) = &order.session_id {
            if self.working.orders.values().any(|o| o.session_id.as_ref() == Some(session)) {
                return Err(conflict("order session", session));
            }
        }
        self.working.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&mut self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn find_order_by_session(&mut self, session_id: &str) -> Result<Option<Order>> {
        #[cfg(test)]
        {
            let mut faults = self.faults();
            if faults.hidden_session_lookups > 0 {
                faults.hidden_session_lookups -= 1;
                return Ok(None);
            }
        }
        Ok(self.working.orders.values().find(|o| o.session_id.as_deref() == Some(session_id)).cloned())
    }

    async fn list_orders(&mut self) -> Result<Vec<Order>> {
        Ok(self.working.orders.values().cloned().collect())
    }

    async fn list_orders_for_identity(&mut self, identity_key: &str) -> Result<Vec<Order>> {
        Ok(self.working.orders.values().filter(|o| o.identity_key.as_deref() == Some(identity_key)).cloned().collect())
    }

    async fn set_order_status(&mut self, id: Uuid, status: OrderStatus) -> Result<bool> {
        Ok(self.working.orders.get_mut(&id).map(|o| o.status = status).is_some())
    }

    async fn find_customers_by_identity(&mut self, identity_key: &str) -> Result<Vec<Customer>> {
        Ok(self.working.customers.values().filter(|c| c.identity_key.as_deref() == Some(identity_key)).cloned().collect())
    }

    async fn insert_customer(&mut self, customer: &Customer) -> Result<()> {
        #[cfg(test)]
        if self.faults().customer_identity_taken {
            return Err(conflict("customer identity", customer.identity_key.as_deref().unwrap_or_default()));
        }
        self.working.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn append_customer_order(&mut self, customer_id: Uuid, order_id: Uuid) -> Result<()> {
        let customer = self.working.customers.get_mut(&customer_id).ok_or(EcommerceError::NotFound("Customer"))?;
        customer.order_ids.push(order_id);
        Ok(())
    }

    async fn list_customers(&mut self) -> Result<Vec<Customer>> {
        Ok(self.working.customers.values().cloned().collect())
    }

    async fn find_user_by_token(&mut self, token_identifier: &str) -> Result<Option<UserIdentity>> {
        Ok(self.working.users.values().find(|u| u.token_identifier == token_identifier).cloned())
    }

    async fn find_user_by_identity(&mut self, identity_key: &str) -> Result<Option<UserIdentity>> {
        Ok(self.working.users.values().find(|u| u.identity_key == identity_key).cloned())
    }

    async fn save_user(&mut self, user: &UserIdentity) -> Result<()> {
        if self.working.users.values().any(|u| u.id != user.id && u.token_identifier == user.token_identifier) {
            return Err(conflict("user token", &user.token_identifier));
        }
        self.working.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        self.working.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&mut self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn lock_product(&mut self, id: Uuid) -> Result<Option<Product>> {
        self.get_product(id).await
    }

    async fn update_product(&mut self, product: &Product) -> Result<()> {
        #[cfg(test)]
        if self.faults().rejected_product_writes.contains(&product.id) {
            return Err(EcommerceError::StorageError(format!("write rejected for product {}", product.id)));
        }
        replace(&mut self.working.products, product.id, product, "Product")
    }

    async fn delete_product(&mut self, id: Uuid) -> Result<bool> {
        Ok(self.working.products.remove(&id).is_some())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>> {
        Ok(self.working.products.values().cloned().collect())
    }

    async fn insert_category(&mut self, category: &Category) -> Result<()> {
        if self.working.categories.values().any(|c| c.slug == category.slug) {
            return Err(conflict("category", &category.slug));
        }
        self.working.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn get_category(&mut self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn update_category(&mut self, category: &Category) -> Result<()> {
        if self.working.categories.values().any(|c| c.id != category.id && c.slug == category.slug) {
            return Err(conflict("category", &category.slug));
        }
        replace(&mut self.working.categories, category.id, category, "Category")
    }

    async fn delete_category(&mut self, id: Uuid) -> Result<bool> {
        let removed = self.working.categories.remove(&id).is_some();
        if removed {
            for product in self.working.products.values_mut().filter(|p| p.category_id == Some(id)) {
                product.category_id = None;
            }
        }
        Ok(removed)
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>> {
        Ok(self.working.categories.values().cloned().collect())
    }

    async fn insert_tag(&mut self, tag: &Tag) -> Result<()> {
        if self.working.tags.values().any(|t| t.name == tag.name) {
            return Err(conflict("tag", &tag.name));
        }
        self.working.tags.insert(tag.id, tag.clone());
        Ok(())
    }

    async fn delete_tag(&mut self, id: Uuid) -> Result<bool> {
        Ok(self.working.tags.remove(&id).is_some())
    }

    async fn list_tags(&mut self) -> Result<Vec<Tag>> {
        Ok(self.working.tags.values().cloned().collect())
    }

    async fn insert_checkout(&mut self, checkout: &Checkout) -> Result<()> {
        if self.working.checkouts.values().any(|c| c.session_id == checkout.session_id) {
            return Err(conflict("checkout session", &checkout.session_id));
        }
        self.working.checkouts.insert(checkout.id, checkout.clone());
        Ok(())
    }

    async fn find_checkout(&mut self, session_id: &str) -> Result<Option<Checkout>> {
        Ok(self.working.checkouts.values().find(|c| c.session_id == session_id).cloned())
    }

    async fn update_checkout(&mut self, checkout: &Checkout) -> Result<()> {
        replace(&mut self.working.checkouts, checkout.id, checkout, "Checkout")
    }

    async fn insert_sale(&mut self, sale: &Sale) -> Result<()> {
        self.working.sales.insert(sale.id, sale.clone());
        Ok(())
    }

    async fn list_sales(&mut self) -> Result<Vec<Sale>> {
        Ok(self.working.sales.values().cloned().collect())
    }

    async fn insert_visit(&mut self, visit: &Visit) -> Result<()> {
        self.working.visits.push(visit.clone());
        Ok(())
    }

    async fn list_visits(&mut self) -> Result<Vec<Visit>> {
        Ok(self.working.visits.clone())
    }

    async fn insert_dashboard_item(&mut self, item: &DashboardItem) -> Result<()> {
        self.working.dashboard_items.push(item.clone());
        Ok(())
    }

    async fn list_dashboard_items(&mut self) -> Result<Vec<DashboardItem>> {
        Ok(self.working.dashboard_items.clone())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let tx = *self;
        let mut guard = tx.guard;
        *guard = tx.working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::tests::draft;

    #[tokio::test]
    async fn test_uncommitted_writes_roll_back() {
        let store = MemoryStore::new();
        let order = Order::place(None, None, draft("Jane Doe", "jane@x.com"));
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_order(&order).await.unwrap();
        }
        let mut tx = store.begin().await.unwrap();
        assert!(tx.get_order(order.id).await.unwrap().is_none());
        tx.insert_order(&order).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.get_order(order.id).await.unwrap(), Some(order));
    }

    #[tokio::test]
    async fn test_duplicate_session_conflicts() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&Order::place(None, Some("abc".into()), draft("A", "a@x.com"))).await.unwrap();
        let err = tx.insert_order(&Order::place(None, Some("abc".into()), draft("B", "b@x.com"))).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Conflict(_)));
    }
}
