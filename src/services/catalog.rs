//! Product, category and tag management.

use std::fmt;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::{Category, CategoryInput, Product, ProductInput, Tag, TagInput};
use crate::identity::{AdminGate, Identity};
use crate::store::{Store, StoreTx};
use crate::{EcommerceError, Result};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    gate: AdminGate,
}

impl fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogService").field("store", &self.store).finish()
    }
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, gate: AdminGate) -> Self { Self { store, gate } }

    // =========================================================================
    // Storefront
    // =========================================================================

    /// Published products, newest first. A store failure yields an empty list.
    #[instrument(skip(self))]
    pub async fn list_published_products(&self) -> Vec<Product> {
        match self.all_products().await {
            Ok(products) => products.into_iter().filter(Product::is_published).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "product listing failed; returning empty catalog");
                Vec::new()
            }
        }
    }

    /// Drafts are invisible to the storefront.
    pub async fn get_published_product(&self, id: Uuid) -> Result<Product> {
        let mut tx = self.store.begin().await?;
        tx.get_product(id).await?
            .filter(Product::is_published)
            .ok_or(EcommerceError::NotFound("Product"))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.store.begin().await?.list_categories().await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut tags = self.store.begin().await?.list_tags().await?;
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    #[instrument(skip(self, caller))]
    pub async fn list_all_products(&self, caller: Option<&Identity>) -> Result<Vec<Product>> {
        self.gate.require_admin(caller)?;
        self.all_products().await
    }

    #[instrument(skip(self, caller, input), fields(name = %input.name))]
    pub async fn create_product(&self, caller: Option<&Identity>, input: ProductInput) -> Result<Product> {
        self.gate.require_admin(caller)?;
        input.validate()?;
        let product = Product::create(input).map_err(|e| EcommerceError::InvalidInput(e.to_string()))?;
        let mut tx = self.store.begin().await?;
        self.ensure_category(tx.as_mut(), product.category_id).await?;
        tx.insert_product(&product).await?;
        tx.commit().await?;
        tracing::info!(product_id = %product.id, stock = %product.stock_quantity, "product created");
        Ok(product)
    }

    /// Replaces every editable field and re-derives the stock status.
    #[instrument(skip(self, caller, input))]
    pub async fn update_product(&self, caller: Option<&Identity>, id: Uuid, input: ProductInput) -> Result<Product> {
        self.gate.require_admin(caller)?;
        input.validate()?;
        let mut tx = self.store.begin().await?;
        let mut product = tx.get_product(id).await?.ok_or(EcommerceError::NotFound("Product"))?;
        product.apply_edit(input).map_err(|e| EcommerceError::InvalidInput(e.to_string()))?;
        self.ensure_category(tx.as_mut(), product.category_id).await?;
        tx.update_product(&product).await?;
        tx.commit().await?;
        Ok(product)
    }

    #[instrument(skip(self, caller))]
    pub async fn delete_product(&self, caller: Option<&Identity>, id: Uuid) -> Result<()> {
        self.gate.require_admin(caller)?;
        let mut tx = self.store.begin().await?;
        if !tx.delete_product(id).await? { return Err(EcommerceError::NotFound("Product")); }
        tx.commit().await
    }

    #[instrument(skip(self, caller, input), fields(name = %input.name))]
    pub async fn create_category(&self, caller: Option<&Identity>, input: CategoryInput) -> Result<Category> {
        self.gate.require_admin(caller)?;
        input.validate()?;
        let category = Category::create(input);
        let mut tx = self.store.begin().await?;
        tx.insert_category(&category).await?;
        tx.commit().await?;
        Ok(category)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update_category(&self, caller: Option<&Identity>, id: Uuid, input: CategoryInput) -> Result<Category> {
        self.gate.require_admin(caller)?;
        input.validate()?;
        let mut tx = self.store.begin().await?;
        let mut category = tx.get_category(id).await?.ok_or(EcommerceError::NotFound("Category"))?;
        category.rename(input);
        tx.update_category(&category).await?;
        tx.commit().await?;
        Ok(category)
    }

    /// Products in the category are kept and become uncategorised.
    #[instrument(skip(self, caller))]
    pub async fn delete_category(&self, caller: Option<&Identity>, id: Uuid) -> Result<()> {
        self.gate.require_admin(caller)?;
        let mut tx = self.store.begin().await?;
        if !tx.delete_category(id).await? { return Err(EcommerceError::NotFound("Category")); }
        tx.commit().await
    }

    #[instrument(skip(self, caller, input), fields(name = %input.name))]
    pub async fn create_tag(&self, caller: Option<&Identity>, input: TagInput) -> Result<Tag> {
        self.gate.require_admin(caller)?;
        input.validate()?;
        let tag = Tag::create(input);
        let mut tx = self.store.begin().await?;
        tx.insert_tag(&tag).await?;
        tx.commit().await?;
        Ok(tag)
    }

    #[instrument(skip(self, caller))]
    pub async fn delete_tag(&self, caller: Option<&Identity>, id: Uuid) -> Result<()> {
        self.gate.require_admin(caller)?;
        let mut tx = self.store.begin().await?;
        if !tx.delete_tag(id).await? { return Err(EcommerceError::NotFound("Tag")); }
        tx.commit().await
    }

    async fn all_products(&self) -> Result<Vec<Product>> {
        let mut products = self.store.begin().await?.list_products().await?;
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(products)
    }

    async fn ensure_category(&self, tx: &mut dyn StoreTx, category_id: Option<Uuid>) -> Result<()> {
        let Some(id) = category_id else { return Ok(()) };
        if tx.get_category(id).await?.is_none() {
            return Err(EcommerceError::InvalidInput(format!("unknown category {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::input;
    use crate::domain::aggregates::{PublishStatus, StockStatus};
    use crate::identity::EmailAllowlist;
    use crate::store::MemoryStore;

    fn service(store: &MemoryStore) -> CatalogService {
        CatalogService::new(Arc::new(store.clone()), AdminGate::new(Arc::new(EmailAllowlist::new(["admin@shop.com"]))))
    }

    fn admin() -> Identity { Identity::new("admin_1", Some("admin@shop.com")) }

    #[tokio::test]
    async fn test_create_product_requires_admin() {
        let store = MemoryStore::new();
        let svc = service(&store);
        assert!(matches!(svc.create_product(None, input("Mug", "1")).await, Err(EcommerceError::Unauthorized)));
        let outsider = Identity::new("u", Some("u@shop.com"));
        assert!(matches!(svc.create_product(Some(&outsider), input("Mug", "1")).await, Err(EcommerceError::Forbidden)));
        assert!(svc.list_published_products().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_stock() {
        let svc = service(&MemoryStore::new());
        let err = svc.create_product(Some(&admin()), input("Mug", "-3")).await.unwrap_err();
        assert!(matches!(err, EcommerceError::InvalidInput(_)));
        let err = svc.create_product(Some(&admin()), input("Mug", "lots")).await.unwrap_err();
        assert!(matches!(err, EcommerceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_edit_rederives_stock_status() {
        let svc = service(&MemoryStore::new());
        let product = svc.create_product(Some(&admin()), input("Mug", "0")).await.unwrap();
        assert_eq!(product.stock_status, StockStatus::OutOfStock);
        let restocked = svc.update_product(Some(&admin()), product.id, input("Mug", "12")).await.unwrap();
        assert_eq!(restocked.stock_status, StockStatus::InStock);
        assert_eq!(restocked.stock_quantity, "12");
    }

    #[tokio::test]
    async fn test_storefront_hides_drafts() {
        let svc = service(&MemoryStore::new());
        let live = svc.create_product(Some(&admin()), input("Mug", "3")).await.unwrap();
        let draft = svc.create_product(Some(&admin()), ProductInput { publish_status: PublishStatus::Draft, ..input("Plate", "3") }).await.unwrap();

        let listed: Vec<Uuid> = svc.list_published_products().await.into_iter().map(|p| p.id).collect();
        assert_eq!(listed, vec![live.id]);
        assert!(matches!(svc.get_published_product(draft.id).await, Err(EcommerceError::NotFound(_))));
        assert_eq!(svc.list_all_products(Some(&admin())).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_category_lifecycle() {
        let svc = service(&MemoryStore::new());
        let category = svc.create_category(Some(&admin()), CategoryInput { name: "Home Goods".into(), description: None }).await.unwrap();
        assert_eq!(category.slug, "home-goods");
        let duplicate = svc.create_category(Some(&admin()), CategoryInput { name: "home goods".into(), description: None }).await;
        assert!(matches!(duplicate, Err(EcommerceError::Conflict(_))));

        let product = svc.create_product(Some(&admin()), ProductInput { category_id: Some(category.id), ..input("Mug", "1") }).await.unwrap();
        svc.delete_category(Some(&admin()), category.id).await.unwrap();
        assert!(svc.list_categories().await.unwrap().is_empty());
        assert_eq!(svc.get_published_product(product.id).await.unwrap().category_id, None);

        let err = svc.create_product(Some(&admin()), ProductInput { category_id: Some(category.id), ..input("Bowl", "1") }).await.unwrap_err();
        assert!(matches!(err, EcommerceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_tags() {
        let svc = service(&MemoryStore::new());
        let tag = svc.create_tag(Some(&admin()), TagInput { name: " Summer ".into() }).await.unwrap();
        assert_eq!(tag.name, "summer");
        assert_eq!(svc.list_tags().await.unwrap().len(), 1);
        svc.delete_tag(Some(&admin()), tag.id).await.unwrap();
        assert!(matches!(svc.delete_tag(Some(&admin()), tag.id).await, Err(EcommerceError::NotFound("Tag"))));
    }
}
