//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use crate::domain::value_objects::{StockError, StockQuantity};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "stock_status")]
pub enum StockStatus {
    #[default]
    #[serde(rename = "In Stock")]
    #[sqlx(rename = "in_stock")]
    InStock,
    #[serde(rename = "Out of Stock")]
    #[sqlx(rename = "out_of_stock")]
    OutOfStock,
}

impl StockStatus {
    /// Out of stock iff nothing is left and the product is not unlimited.
    pub fn for_level(stock: StockQuantity, unlimited: bool) -> Self {
        if stock.is_zero() && !unlimited { Self::OutOfStock } else { Self::InStock }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "publish_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus { #[default] Draft, Published }

/// Admin payload for creating or replacing a product.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub discounted_price: Option<i64>,
    pub stock_quantity: String,
    #[serde(default)]
    pub unlimited_stock: bool,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub publish_status: PublishStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub discounted_price: Option<i64>,
    pub stock_quantity: String,
    pub unlimited_stock: bool,
    pub stock_status: StockStatus,
    pub images: Vec<String>,
    pub category_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub publish_status: PublishStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of taking sold units off a product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StockAdjustment { pub before: u64, pub after: u64, pub depleted: bool }

impl Product {
    pub fn create(input: ProductInput) -> Result<Self, StockError> {
        let stock = StockQuantity::parse(&input.stock_quantity)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            discounted_price: input.discounted_price,
            stock_quantity: stock.to_string(),
            unlimited_stock: input.unlimited_stock,
            stock_status: StockStatus::for_level(stock, input.unlimited_stock),
            images: input.images,
            category_id: input.category_id,
            tags: input.tags,
            publish_status: input.publish_status,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_edit(&mut self, input: ProductInput) -> Result<(), StockError> {
        let stock = StockQuantity::parse(&input.stock_quantity)?;
        self.name = input.name.trim().to_string();
        self.description = input.description;
        self.price = input.price;
        self.discounted_price = input.discounted_price;
        self.stock_quantity = stock.to_string();
        self.unlimited_stock = input.unlimited_stock;
        self.stock_status = StockStatus::for_level(stock, input.unlimited_stock);
        self.images = input.images;
        self.category_id = input.category_id;
        self.tags = input.tags;
        self.publish_status = input.publish_status;
        self.touch();
        Ok(())
    }

    pub fn stock(&self) -> StockQuantity { StockQuantity::parse_lenient(Some(&self.stock_quantity)) }
    pub fn is_published(&self) -> bool { self.publish_status == PublishStatus::Published }

    /// Clamped decrement. Stock status only ever moves to out-of-stock here;
    /// restocking is an admin edit.
    pub fn remove_sold(&mut self, qty: u32) -> StockAdjustment {
        let before = self.stock();
        let after = before.decrement_clamped(u64::from(qty));
        self.stock_quantity = after.to_string();
        if after.is_zero() { self.stock_status = StockStatus::OutOfStock; }
        self.touch();
        StockAdjustment { before: before.value(), after: after.value(), depleted: after.is_zero() }
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn input(name: &str, stock: &str) -> ProductInput {
        ProductInput { name: name.into(), price: 1000, stock_quantity: stock.into(), publish_status: PublishStatus::Published, ..Default::default() }
    }

    #[test]
    fn test_product_create_derives_stock_status() {
        let p = Product::create(input("Mug", "0")).unwrap();
        assert_eq!(p.stock_status, StockStatus::OutOfStock);
        let p = Product::create(ProductInput { unlimited_stock: true, ..input("Ebook", "0") }).unwrap();
        assert_eq!(p.stock_status, StockStatus::InStock);
        let p = Product::create(input("Mug", "3")).unwrap();
        assert_eq!(p.stock_status, StockStatus::InStock);
        assert!(Product::create(input("Mug", "-2")).is_err());
    }

    #[test]
    fn test_remove_sold_clamps() {
        let mut p = Product::create(input("Mug", "5")).unwrap();
        let adj = p.remove_sold(7);
        assert_eq!(adj, StockAdjustment { before: 5, after: 0, depleted: true });
        assert_eq!(p.stock_quantity, "0");
        assert_eq!(p.stock_status, StockStatus::OutOfStock);
    }

    #[test]
    fn test_remove_sold_leaves_status_alone_above_zero() {
        let mut p = Product::create(input("Mug", "5")).unwrap();
        p.stock_status = StockStatus::OutOfStock;
        p.remove_sold(2);
        assert_eq!(p.stock_quantity, "3");
        assert_eq!(p.stock_status, StockStatus::OutOfStock);
    }

    #[test]
    fn test_stock_status_wire_format() {
        assert_eq!(serde_json::to_string(&StockStatus::OutOfStock).unwrap(), "\"Out of Stock\"");
    }
}
