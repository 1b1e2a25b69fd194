//! PostgreSQL store.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;
use crate::domain::aggregates::{
    Category, Checkout, Customer, DashboardItem, Order, OrderStatus, Product, Sale, Tag, UserIdentity, Visit,
};
use crate::store::{Store, StoreTx};
use crate::{EcommerceError, Result};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Connects and applies pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| EcommerceError::StorageError(e.to_string()))?;
        tracing::info!(max_connections, "connected to postgres");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        Ok(Box::new(PgTx { tx: self.pool.begin().await? }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

/// Maps unique-index violations to `Conflict` so callers can recover.
fn unique_conflict(err: sqlx::Error, what: &str) -> EcommerceError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            EcommerceError::Conflict(format!("{} already exists ({})", what, db.constraint().unwrap_or("unique index")))
        }
        _ => EcommerceError::Database(err),
    }
}

fn ensure_updated(rows: u64, what: &'static str) -> Result<()> {
    if rows == 0 { Err(EcommerceError::NotFound(what)) } else { Ok(()) }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_order(&mut self, o: &Order) -> Result<()> {
        sqlx::query("INSERT INTO orders (id, identity_key, customer_name, customer_email, customer_phone, items, total_price, shipping_address, status, payment_status, session_id, payment_intent_ref, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)")
            .bind(o.id).bind(&o.identity_key).bind(&o.customer.name).bind(&o.customer.email).bind(&o.customer.phone)
            .bind(&o.items).bind(o.total_price).bind(&o.shipping_address).bind(o.status).bind(o.payment_status)
            .bind(&o.session_id).bind(&o.payment_intent_ref).bind(o.created_at)
            .execute(&mut *self.tx).await.map_err(|e| unique_conflict(e, "order session"))?;
        Ok(())
    }

    async fn get_order(&mut self, id: Uuid) -> Result<Option<Order>> {
        Ok(sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(&mut *self.tx).await?)
    }

    async fn find_order_by_session(&mut self, session_id: &str) -> Result<Option<Order>> {
        Ok(sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE session_id = $1").bind(session_id).fetch_optional(&mut *self.tx).await?)
    }

    async fn list_orders(&mut self) -> Result<Vec<Order>> {
        Ok(sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC").fetch_all(&mut *self.tx).await?)
    }

    async fn list_orders_for_identity(&mut self, identity_key: &str) -> Result<Vec<Order>> {
        Ok(sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE identity_key = $1 ORDER BY created_at DESC").bind(identity_key).fetch_all(&mut *self.tx).await?)
    }

    async fn set_order_status(&mut self, id: Uuid, status: OrderStatus) -> Result<bool> {
        let done = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1").bind(id).bind(status).execute(&mut *self.tx).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn find_customers_by_identity(&mut self, identity_key: &str) -> Result<Vec<Customer>> {
        Ok(sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE identity_key = $1 FOR UPDATE").bind(identity_key).fetch_all(&mut *self.tx).await?)
    }

    async fn insert_customer(&mut self, c: &Customer) -> Result<()> {
        sqlx::query("INSERT INTO customers (id, identity_key, first_name, last_name, email, phone, username, order_ids, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)")
            .bind(c.id).bind(&c.identity_key).bind(&c.first_name).bind(&c.last_name).bind(&c.email).bind(&c.phone)
            .bind(&c.username).bind(&c.order_ids).bind(c.created_at)
            .execute(&mut *self.tx).await.map_err(|e| unique_conflict(e, "customer identity"))?;
        Ok(())
    }

    async fn append_customer_order(&mut self, customer_id: Uuid, order_id: Uuid) -> Result<()> {
        let done = sqlx::query("UPDATE customers SET order_ids = array_append(order_ids, $2) WHERE id = $1")
            .bind(customer_id).bind(order_id).execute(&mut *self.tx).await?;
        ensure_updated(done.rows_affected(), "Customer")
    }

    async fn list_customers(&mut self) -> Result<Vec<Customer>> {
        Ok(sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at DESC").fetch_all(&mut *self.tx).await?)
    }

    async fn find_user_by_token(&mut self, token_identifier: &str) -> Result<Option<UserIdentity>> {
        Ok(sqlx::query_as::<_, UserIdentity>("SELECT * FROM users WHERE token_identifier = $1").bind(token_identifier).fetch_optional(&mut *self.tx).await?)
    }

    async fn find_user_by_identity(&mut self, identity_key: &str) -> Result<Option<UserIdentity>> {
        Ok(sqlx::query_as::<_, UserIdentity>("SELECT * FROM users WHERE identity_key = $1 ORDER BY created_at LIMIT 1").bind(identity_key).fetch_optional(&mut *self.tx).await?)
    }

    async fn save_user(&mut self, u: &UserIdentity) -> Result<()> {
        sqlx::query("INSERT INTO users (id, token_identifier, identity_key, name, email, picture_url, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email, picture_url = EXCLUDED.picture_url")
            .bind(u.id).bind(&u.token_identifier).bind(&u.identity_key).bind(&u.name).bind(&u.email).bind(&u.picture_url).bind(u.created_at)
            .execute(&mut *self.tx).await.map_err(|e| unique_conflict(e, "user token"))?;
        Ok(())
    }

    async fn insert_product(&mut self, p: &Product) -> Result<()> {
        sqlx::query("INSERT INTO products (id, name, description, price, discounted_price, stock_quantity, unlimited_stock, stock_status, images, category_id, tags, publish_status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(p.discounted_price).bind(&p.stock_quantity)
            .bind(p.unlimited_stock).bind(p.stock_status).bind(&p.images).bind(p.category_id).bind(&p.tags)
            .bind(p.publish_status).bind(p.created_at).bind(p.updated_at)
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn get_product(&mut self, id: Uuid) -> Result<Option<Product>> {
        Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(&mut *self.tx).await?)
    }

    async fn lock_product(&mut self, id: Uuid) -> Result<Option<Product>> {
        Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE").bind(id).fetch_optional(&mut *self.tx).await?)
    }

    async fn update_product(&mut self, p: &Product) -> Result<()> {
        let done = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, discounted_price = $5, stock_quantity = $6, unlimited_stock = $7, stock_status = $8, images = $9, category_id = $10, tags = $11, publish_status = $12, updated_at = $13 WHERE id = $1")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(p.discounted_price).bind(&p.stock_quantity)
            .bind(p.unlimited_stock).bind(p.stock_status).bind(&p.images).bind(p.category_id).bind(&p.tags)
            .bind(p.publish_status).bind(p.updated_at)
            .execute(&mut *self.tx).await?;
        ensure_updated(done.rows_affected(), "Product")
    }

    async fn delete_product(&mut self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&mut *self.tx).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_products(&mut self) -> Result<Vec<Product>> {
        Ok(sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC").fetch_all(&mut *self.tx).await?)
    }

    async fn insert_category(&mut self, c: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name, slug, description, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(c.id).bind(&c.name).bind(&c.slug).bind(&c.description).bind(c.created_at)
            .execute(&mut *self.tx).await.map_err(|e| unique_conflict(e, "category"))?;
        Ok(())
    }

    async fn get_category(&mut self, id: Uuid) -> Result<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(&mut *self.tx).await?)
    }

    async fn update_category(&mut self, c: &Category) -> Result<()> {
        let done = sqlx::query("UPDATE categories SET name = $2, slug = $3, description = $4 WHERE id = $1")
            .bind(c.id).bind(&c.name).bind(&c.slug).bind(&c.description)
            .execute(&mut *self.tx).await.map_err(|e| unique_conflict(e, "category"))?;
        ensure_updated(done.rows_affected(), "Category")
    }

    async fn delete_category(&mut self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&mut *self.tx).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name").fetch_all(&mut *self.tx).await?)
    }

    async fn insert_tag(&mut self, t: &Tag) -> Result<()> {
        sqlx::query("INSERT INTO tags (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(t.id).bind(&t.name).bind(t.created_at)
            .execute(&mut *self.tx).await.map_err(|e| unique_conflict(e, "tag"))?;
        Ok(())
    }

    async fn delete_tag(&mut self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM tags WHERE id = $1").bind(id).execute(&mut *self.tx).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_tags(&mut self) -> Result<Vec<Tag>> {
        Ok(sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name").fetch_all(&mut *self.tx).await?)
    }

    async fn insert_checkout(&mut self, c: &Checkout) -> Result<()> {
        sqlx::query("INSERT INTO checkouts (id, session_id, status, amount, currency, identity_key, created_at, completed_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(c.id).bind(&c.session_id).bind(c.status).bind(c.amount).bind(&c.currency).bind(&c.identity_key)
            .bind(c.created_at).bind(c.completed_at)
            .execute(&mut *self.tx).await.map_err(|e| unique_conflict(e, "checkout session"))?;
        Ok(())
    }

    async fn find_checkout(&mut self, session_id: &str) -> Result<Option<Checkout>> {
        Ok(sqlx::query_as::<_, Checkout>("SELECT * FROM checkouts WHERE session_id = $1 FOR UPDATE").bind(session_id).fetch_optional(&mut *self.tx).await?)
    }

    async fn update_checkout(&mut self, c: &Checkout) -> Result<()> {
        let done = sqlx::query("UPDATE checkouts SET status = $2, completed_at = $3 WHERE id = $1")
            .bind(c.id).bind(c.status).bind(c.completed_at).execute(&mut *self.tx).await?;
        ensure_updated(done.rows_affected(), "Checkout")
    }

    async fn insert_sale(&mut self, s: &Sale) -> Result<()> {
        sqlx::query("INSERT INTO sales (id, products, customer, transaction_details, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(s.id).bind(&s.products).bind(&s.customer).bind(&s.transaction).bind(s.created_at)
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn list_sales(&mut self) -> Result<Vec<Sale>> {
        Ok(sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY created_at DESC").fetch_all(&mut *self.tx).await?)
    }

    async fn insert_visit(&mut self, v: &Visit) -> Result<()> {
        sqlx::query("INSERT INTO visits (id, identity_key, path, visited_at) VALUES ($1, $2, $3, $4)")
            .bind(v.id).bind(&v.identity_key).bind(&v.path).bind(v.visited_at)
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn list_visits(&mut self) -> Result<Vec<Visit>> {
        Ok(sqlx::query_as::<_, Visit>("SELECT * FROM visits ORDER BY visited_at").fetch_all(&mut *self.tx).await?)
    }

    async fn insert_dashboard_item(&mut self, d: &DashboardItem) -> Result<()> {
        sqlx::query("INSERT INTO dashboard_items (id, title, value, created_at) VALUES ($1, $2, $3, $4)")
            .bind(d.id).bind(&d.title).bind(&d.value).bind(d.created_at)
            .execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn list_dashboard_items(&mut self) -> Result<Vec<DashboardItem>> {
        Ok(sqlx::query_as::<_, DashboardItem>("SELECT * FROM dashboard_items ORDER BY created_at").fetch_all(&mut *self.tx).await?)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let PgTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
