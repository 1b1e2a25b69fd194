//! Customer Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::order::CustomerSnapshot;
use crate::domain::value_objects::{username_from_email, PersonName};

/// Deduplicated person record. Guests have no identity key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub identity_key: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub username: String,
    pub order_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// New profile for a first order. Name and username are derived from the contact.
    pub fn register(identity_key: Option<String>, contact: &CustomerSnapshot, first_order: Uuid) -> Self {
        let name = PersonName::split(&contact.name);
        Self {
            id: Uuid::now_v7(),
            identity_key,
            first_name: name.first,
            last_name: name.last,
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            username: username_from_email(&contact.email),
            order_ids: vec![first_order],
            created_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> String {
        PersonName { first: self.first_name.clone(), last: self.last_name.clone() }.full()
    }

    pub fn owns_order(&self, order_id: Uuid) -> bool { self.order_ids.contains(&order_id) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_guest() {
        let order_id = Uuid::now_v7();
        let c = Customer::register(None, &CustomerSnapshot::new("Jane Doe", "jane@x.com", None), order_id);
        assert_eq!(c.first_name, "Jane");
        assert_eq!(c.last_name, "Doe");
        assert_eq!(c.username, "jane");
        assert_eq!(c.order_ids, vec![order_id]);
        assert!(c.identity_key.is_none());
        assert_eq!(c.display_name(), "Jane Doe");
    }
}
