//! Transactional document storage.
//!
//! Every service call opens one [`StoreTx`], performs its reads and writes
//! through it and commits. Dropping a transaction without committing rolls it
//! back.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;
use crate::domain::aggregates::{
    Category, Checkout, Customer, DashboardItem, Order, OrderStatus, Product, Sale, Tag, UserIdentity, Visit,
};
use crate::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;
}

#[async_trait]
pub trait StoreTx: Send {
    // orders
    async fn insert_order(&mut self, order: &Order) -> Result<()>;
    async fn get_order(&mut self, id: Uuid) -> Result<Option<Order>>;
    async fn find_order_by_session(&mut self, session_id: &str) -> Result<Option<Order>>;
    async fn list_orders(&mut self) -> Result<Vec<Order>>;
    async fn list_orders_for_identity(&mut self, identity_key: &str) -> Result<Vec<Order>>;
    /// Returns false when no order has that id.
    async fn set_order_status(&mut self, id: Uuid, status: OrderStatus) -> Result<bool>;

    // customers
    async fn find_customers_by_identity(&mut self, identity_key: &str) -> Result<Vec<Customer>>;
    async fn insert_customer(&mut self, customer: &Customer) -> Result<()>;
    async fn append_customer_order(&mut self, customer_id: Uuid, order_id: Uuid) -> Result<()>;
    async fn list_customers(&mut self) -> Result<Vec<Customer>>;

    // user identities
    async fn find_user_by_token(&mut self, token_identifier: &str) -> Result<Option<UserIdentity>>;
    async fn find_user_by_identity(&mut self, identity_key: &str) -> Result<Option<UserIdentity>>;
    async fn save_user(&mut self, user: &UserIdentity) -> Result<()>;

    // catalog
    async fn insert_product(&mut self, product: &Product) -> Result<()>;
    async fn get_product(&mut self, id: Uuid) -> Result<Option<Product>>;
    /// Like `get_product`, but holds a row lock until the transaction ends.
    async fn lock_product(&mut self, id: Uuid) -> Result<Option<Product>>;
    async fn update_product(&mut self, product: &Product) -> Result<()>;
    async fn delete_product(&mut self, id: Uuid) -> Result<bool>;
    async fn list_products(&mut self) -> Result<Vec<Product>>;
    async fn insert_category(&mut self, category: &Category) -> Result<()>;
    async fn get_category(&mut self, id: Uuid) -> Result<Option<Category>>;
    async fn update_category(&mut self, category: &Category) -> Result<()>;
    async fn delete_category(&mut self, id: Uuid) -> Result<bool>;
    async fn list_categories(&mut self) -> Result<Vec<Category>>;
    async fn insert_tag(&mut self, tag: &Tag) -> Result<()>;
    async fn delete_tag(&mut self, id: Uuid) -> Result<bool>;
    async fn list_tags(&mut self) -> Result<Vec<Tag>>;

    // checkouts
    async fn insert_checkout(&mut self, checkout: &Checkout) -> Result<()>;
    async fn find_checkout(&mut self, session_id: &str) -> Result<Option<Checkout>>;
    async fn update_checkout(&mut self, checkout: &Checkout) -> Result<()>;

    // sales and analytics
    async fn insert_sale(&mut self, sale: &Sale) -> Result<()>;
    async fn list_sales(&mut self) -> Result<Vec<Sale>>;
    async fn insert_visit(&mut self, visit: &Visit) -> Result<()>;
    async fn list_visits(&mut self) -> Result<Vec<Visit>>;
    async fn insert_dashboard_item(&mut self, item: &DashboardItem) -> Result<()>;
    async fn list_dashboard_items(&mut self) -> Result<Vec<DashboardItem>>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
