//! Stored identity profiles.

use std::fmt;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use crate::domain::aggregates::UserIdentity;
use crate::identity::Identity;
use crate::store::Store;
use crate::{EcommerceError, Result};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl fmt::Debug for UserService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserService").field("store", &self.store).finish()
    }
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    /// Upserts the caller's profile by token identifier and returns its id.
    #[instrument(skip(self, caller))]
    pub async fn store(&self, caller: Option<&Identity>) -> Result<Uuid> {
        let caller = caller.ok_or(EcommerceError::Unauthorized)?;
        let mut tx = self.store.begin().await?;
        if let Some(mut user) = tx.find_user_by_token(&caller.token_identifier).await? {
            if user.refresh(caller) {
                tx.save_user(&user).await?;
                tx.commit().await?;
            }
            return Ok(user.id);
        }
        let user = UserIdentity::from_identity(caller);
        tx.save_user(&user).await?;
        tx.commit().await?;
        tracing::info!(user_id = %user.id, "stored new user identity");
        Ok(user.id)
    }

    pub async fn current_user(&self, caller: Option<&Identity>) -> Result<Option<UserIdentity>> {
        let Some(caller) = caller else { return Ok(None) };
        let mut tx = self.store.begin().await?;
        tx.find_user_by_token(&caller.token_identifier).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_store_upserts_by_token() {
        let svc = UserService::new(Arc::new(MemoryStore::new()));
        let mut caller = Identity::new("user_1", Some("old@x.com"));
        let id = svc.store(Some(&caller)).await.unwrap();
        caller.email = Some("new@x.com".into());
        caller.name = Some("New Name".into());
        assert_eq!(svc.store(Some(&caller)).await.unwrap(), id);

        let user = svc.current_user(Some(&caller)).await.unwrap().unwrap();
        assert_eq!(user.email.as_deref(), Some("new@x.com"));
        assert_eq!(user.name.as_deref(), Some("New Name"));
    }

    #[tokio::test]
    async fn test_anonymous_caller() {
        let svc = UserService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(svc.store(None).await, Err(EcommerceError::Unauthorized)));
        assert!(svc.current_user(None).await.unwrap().is_none());
    }
}
