use std::sync::Arc;

use uuid::Uuid;

use crate::db::{StoreError, UserStore};
use crate::models::user::{Session, User};

/// Per-user list of active refresh-token digests.
///
/// Every call re-reads the user from the store before touching `sessions`,
/// so a record fetched earlier in the request is never written back.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn UserStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    async fn load(&self, user_id: Uuid) -> Result<User, StoreError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    pub async fn append(&self, user_id: Uuid, digest: String) -> Result<(), StoreError> {
        let mut user = self.load(user_id).await?;
        user.sessions.push(Session { token: digest });
        self.store.save(&user).await
    }

    /// Drops every entry equal to `digest` and returns how many went away.
    /// Nothing is written when no entry matches.
    pub async fn remove_one(&self, user_id: Uuid, digest: &str) -> Result<usize, StoreError> {
        let mut user = self.load(user_id).await?;
        let before = user.sessions.len();
        user.sessions.retain(|s| s.token != digest);
        let removed = before - user.sessions.len();
        if removed > 0 {
            self.store.save(&user).await?;
        }
        Ok(removed)
    }

    pub async fn clear_all(&self, user_id: Uuid) -> Result<usize, StoreError> {
        let mut user = self.load(user_id).await?;
        let removed = user.sessions.len();
        user.sessions.clear();
        self.store.save(&user).await?;
        Ok(removed)
    }

    /// The user, if it still exists and one of its sessions holds `digest`.
    pub async fn find_by_digest(
        &self,
        user_id: Uuid,
        digest: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .store
            .find_by_id(user_id)
            .await?
            .filter(|u| u.has_session(digest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserStore;
    use crate::models::user::{NewUser, UserRole};

    async fn setup() -> (SessionStore, Arc<MemoryUserStore>, Uuid) {
        let store = Arc::new(MemoryUserStore::new());
        let user = store
            .insert(NewUser {
                email: "a@b.com".into(),
                password_hash: "x".into(),
                role: UserRole::Client,
            })
            .await
            .unwrap();
        (SessionStore::new(store.clone()), store, user.id)
    }

    async fn digests(store: &MemoryUserStore, id: Uuid) -> Vec<String> {
        store
            .find_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .sessions
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[tokio::test]
    async fn test_append_keeps_order_and_duplicates() {
        let (sessions, store, id) = setup().await;
        sessions.append(id, "d1".into()).await.unwrap();
        sessions.append(id, "d2".into()).await.unwrap();
        sessions.append(id, "d1".into()).await.unwrap();

        assert_eq!(digests(&store, id).await, vec!["d1", "d2", "d1"]);
    }

    #[tokio::test]
    async fn test_remove_one_is_idempotent() {
        let (sessions, store, id) = setup().await;
        sessions.append(id, "d1".into()).await.unwrap();
        sessions.append(id, "d2".into()).await.unwrap();

        assert_eq!(sessions.remove_one(id, "d1").await.unwrap(), 1);
        assert_eq!(sessions.remove_one(id, "d1").await.unwrap(), 0);
        assert_eq!(sessions.remove_one(id, "unknown").await.unwrap(), 0);
        assert_eq!(digests(&store, id).await, vec!["d2"]);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (sessions, store, id) = setup().await;
        sessions.append(id, "d1".into()).await.unwrap();
        sessions.append(id, "d2".into()).await.unwrap();

        assert_eq!(sessions.clear_all(id).await.unwrap(), 2);
        assert!(digests(&store, id).await.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_digest() {
        let (sessions, _store, id) = setup().await;
        sessions.append(id, "d1".into()).await.unwrap();

        assert!(sessions.find_by_digest(id, "d1").await.unwrap().is_some());
        assert!(sessions.find_by_digest(id, "d2").await.unwrap().is_none());
        assert!(sessions.find_by_digest(Uuid::new_v4(), "d1").await.unwrap().is_none());

        sessions.remove_one(id, "d1").await.unwrap();
        assert!(sessions.find_by_digest(id, "d1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mutations_on_missing_user() {
        let (sessions, _store, _id) = setup().await;
        let ghost = Uuid::new_v4();

        assert!(matches!(sessions.append(ghost, "d".into()).await, Err(StoreError::NotFound)));
        assert!(matches!(sessions.remove_one(ghost, "d").await, Err(StoreError::NotFound)));
        assert!(matches!(sessions.clear_all(ghost).await, Err(StoreError::NotFound)));
    }
}
