pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::{NewUser, User};

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded from ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already exists")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistent user records, including each user's session list.
///
/// `save` writes the whole record back. Callers doing read-modify-write on
/// `sessions` get last-writer-wins semantics; nothing serializes concurrent
/// saves of the same user.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with `StoreError::Conflict` when the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Persists email, password hash, role and sessions. `NotFound` if the id is gone.
    async fn save(&self, user: &User) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Removes the user and returns the record that was removed.
    async fn delete(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Returns the user only when the password matches the stored bcrypt hash.
    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, StoreError> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };
        match bcrypt::verify(password, &user.password_hash) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(e) => {
                tracing::warn!("bcrypt verify failed for user_id={}: {}", user.id, e);
                Ok(None)
            }
        }
    }
}
