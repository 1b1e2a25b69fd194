//! Customer reconciliation for new orders.

use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::{Customer, CustomerSnapshot};
use crate::store::StoreTx;
use crate::{EcommerceError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "customer_id", rename_all = "snake_case")]
pub enum CustomerUpsert {
    Created(Uuid),
    Appended(Uuid),
}

impl CustomerUpsert {
    pub fn customer_id(&self) -> Uuid {
        match self { Self::Created(id) | Self::Appended(id) => *id }
    }
}

/// Links `order_id` to the customer behind `identity_key`, creating one when
/// needed. Guests (no key) always get a fresh customer; email alone never
/// merges records. An existing profile keeps its contact fields.
pub async fn upsert_customer_for_order(
    tx: &mut dyn StoreTx,
    identity_key: Option<&str>,
    contact: &CustomerSnapshot,
    order_id: Uuid,
) -> Result<CustomerUpsert> {
    if let Some(key) = identity_key {
        let mut found = tx.find_customers_by_identity(key).await?;
        if found.len() > 1 {
            tracing::error!(identity_key = key, matches = found.len(), "customer identity key is not unique");
            return Err(EcommerceError::DuplicateCustomer(key.to_string()));
        }
        if let Some(existing) = found.pop() {
            tx.append_customer_order(existing.id, order_id).await?;
            return Ok(CustomerUpsert::Appended(existing.id));
        }
    }

    let customer = Customer::register(identity_key.map(str::to_string), contact, order_id);
    tx.insert_customer(&customer).await?;
    tracing::debug!(customer_id = %customer.id, guest = identity_key.is_none(), "registered customer");
    Ok(CustomerUpsert::Created(customer.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store};

    fn jane() -> CustomerSnapshot { CustomerSnapshot::new("Jane Doe", "jane@x.com", None) }

    #[tokio::test]
    async fn test_guest_creates_customer_with_split_name() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let order_id = Uuid::now_v7();
        let upsert = upsert_customer_for_order(tx.as_mut(), None, &jane(), order_id).await.unwrap();

        let customers = tx.list_customers().await.unwrap();
        assert_eq!(customers.len(), 1);
        let c = &customers[0];
        assert_eq!(upsert, CustomerUpsert::Created(c.id));
        assert_eq!((c.first_name.as_str(), c.last_name.as_str(), c.username.as_str()), ("Jane", "Doe", "jane"));
        assert_eq!(c.order_ids, vec![order_id]);
    }

    #[tokio::test]
    async fn test_known_identity_appends_and_keeps_contact() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let first = upsert_customer_for_order(tx.as_mut(), Some("user_1"), &jane(), Uuid::now_v7()).await.unwrap();
        let renamed = CustomerSnapshot::new("Janet Smith", "janet@y.com", Some("555".into()));
        let second = upsert_customer_for_order(tx.as_mut(), Some("user_1"), &renamed, Uuid::now_v7()).await.unwrap();

        assert_eq!(second, CustomerUpsert::Appended(first.customer_id()));
        let customers = tx.find_customers_by_identity("user_1").await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].order_ids.len(), 2);
        assert_eq!(customers[0].email, "jane@x.com");
        assert!(customers[0].phone.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_identity_is_an_error() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        for _ in 0..2 {
            tx.insert_customer(&Customer::register(Some("user_1".into()), &jane(), Uuid::now_v7())).await.unwrap();
        }
        let err = upsert_customer_for_order(tx.as_mut(), Some("user_1"), &jane(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, EcommerceError::DuplicateCustomer(key) if key == "user_1"));
    }

    #[tokio::test]
    async fn test_single_token_name_defaults() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        upsert_customer_for_order(tx.as_mut(), None, &CustomerSnapshot::new("   ", "x@y.com", None), Uuid::now_v7()).await.unwrap();
        let c = tx.list_customers().await.unwrap().remove(0);
        assert_eq!(c.first_name, "Unknown");
        assert_eq!(c.last_name, "");
    }
}
