use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::user::{NewUser, User};

/// In-process user store. Used by the test suite and for running the API
/// without a database; keeps insertion order for `list`.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn index_by_id(users: &[User], id: Uuid) -> Option<usize> {
        users.iter().position(|u| u.id == id)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::Conflict);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            sessions: Vec::new(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StoreError::Conflict);
        }
        let idx = Self::index_by_id(&users, user.id).ok_or(StoreError::NotFound)?;
        users[idx] = user.clone();
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().await.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        Ok(Self::index_by_id(&users, id).map(|idx| users.remove(idx)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{Session, UserRole};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: bcrypt::hash("pw", 4).unwrap(),
            role: UserRole::Client,
        }
    }

    #[tokio::test]
    async fn test_insert_enforces_unique_email() {
        let store = MemoryUserStore::new();
        store.insert(new_user("a@b.com")).await.unwrap();
        let dup = store.insert(new_user("a@b.com")).await;
        assert!(matches!(dup, Err(StoreError::Conflict)));
    }

    #[tokio::test]
    async fn test_find_by_credentials() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("a@b.com")).await.unwrap();

        let found = store.find_by_credentials("a@b.com", "pw").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        assert!(store.find_by_credentials("a@b.com", "nope").await.unwrap().is_none());
        assert!(store.find_by_credentials("x@b.com", "pw").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_unknown_user_is_not_found() {
        let store = MemoryUserStore::new();
        let ghost = User {
            id: Uuid::new_v4(),
            email: "ghost@b.com".into(),
            password_hash: String::new(),
            role: UserRole::Client,
            sessions: vec![],
        };
        assert!(matches!(store.save(&ghost).await, Err(StoreError::NotFound)));
    }

    // Two stale copies written back one after the other: the second write
    // replaces the first wholesale. Session lists are not merged.
    #[tokio::test]
    async fn test_save_is_last_writer_wins() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("a@b.com")).await.unwrap();

        let mut first = store.find_by_id(user.id).await.unwrap().unwrap();
        let mut second = store.find_by_id(user.id).await.unwrap().unwrap();
        first.sessions.push(Session { token: "device-1".into() });
        second.sessions.push(Session { token: "device-2".into() });

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.sessions, vec![Session { token: "device-2".into() }]);
    }

    #[tokio::test]
    async fn test_delete_returns_removed_user() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("a@b.com")).await.unwrap();

        let removed = store.delete(user.id).await.unwrap();
        assert_eq!(removed.map(|u| u.email), Some("a@b.com".to_string()));
        assert!(store.delete(user.id).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }
}
