//! Stored identity-provider profile

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::identity::Identity;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserIdentity {
    pub id: Uuid,
    pub token_identifier: String,
    pub identity_key: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserIdentity {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            id: Uuid::now_v7(),
            token_identifier: identity.token_identifier.clone(),
            identity_key: identity.subject.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            picture_url: identity.picture_url.clone(),
            created_at: Utc::now(),
        }
    }

    /// Copies the latest claims. Returns true when anything changed.
    pub fn refresh(&mut self, identity: &Identity) -> bool {
        let changed = self.name != identity.name || self.email != identity.email || self.picture_url != identity.picture_url;
        self.name = identity.name.clone();
        self.email = identity.email.clone();
        self.picture_url = identity.picture_url.clone();
        changed
    }
}
