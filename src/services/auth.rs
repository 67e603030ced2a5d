use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::Config,
    db::UserStore,
    error::AuthError,
    models::user::{NewUser, PublicUser, RegisterRequest, User},
    services::{sessions::SessionStore, tokens::TokenCodec, vault::TokenVault},
};

/// Tokens handed back after register/login. The refresh token goes into the
/// cookie; only its digest is kept server-side.
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    sessions: SessionStore,
    codec: Arc<TokenCodec>,
    vault: TokenVault,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        codec: Arc<TokenCodec>,
        vault: TokenVault,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            sessions: SessionStore::new(store.clone()),
            store,
            codec,
            vault,
            bcrypt_cost,
        }
    }

    pub fn from_config(store: Arc<dyn UserStore>, config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            store,
            Arc::new(TokenCodec::from_config(config)),
            TokenVault::new(&config.refresh_token_hash_secret)?,
            config.bcrypt_cost,
        ))
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(bcrypt::hash(password, self.bcrypt_cost)?)
    }

    /// Create the user, then open its first session.
    pub async fn register(&self, req: RegisterRequest) -> Result<IssuedTokens, AuthError> {
        let password_hash = self.hash_password(&req.password)?;
        let user = self
            .store
            .insert(NewUser {
                email: req.email.trim().to_string(),
                password_hash,
                role: req.role,
            })
            .await?;

        tracing::info!("register: created user_id={} role={}", user.id, user.role);
        self.open_session(&user).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedTokens, AuthError> {
        let user = self
            .store
            .find_by_credentials(email.trim(), password)
            .await?
            .ok_or(AuthError::Unauthorized("Invalid email or password"))?;

        tracing::info!("login: user_id={}", user.id);
        self.open_session(&user).await
    }

    async fn open_session(&self, user: &User) -> Result<IssuedTokens, AuthError> {
        let access_token = self.codec.issue_access(user)?;
        let refresh_token = self.codec.issue_refresh(&user.id)?;

        self.sessions
            .append(user.id, self.vault.hash(&refresh_token))
            .await?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            user: user.into(),
        })
    }

    /// Drop the session matching the presented refresh token. A missing or
    /// already-revoked token leaves the session list untouched.
    pub async fn logout(&self, user_id: Uuid, refresh_token: Option<&str>) -> Result<(), AuthError> {
        let Some(raw) = refresh_token.filter(|t| !t.is_empty()) else {
            self.store
                .find_by_id(user_id)
                .await?
                .ok_or(AuthError::NotFound)?;
            tracing::debug!("logout: no refresh cookie for user_id={}", user_id);
            return Ok(());
        };

        let removed = self.sessions.remove_one(user_id, &self.vault.hash(raw)).await?;
        tracing::info!("logout: user_id={} removed={}", user_id, removed);
        Ok(())
    }

    pub async fn logout_all(&self, user_id: Uuid) -> Result<(), AuthError> {
        let removed = self.sessions.clear_all(user_id).await?;
        tracing::info!("logout_all: user_id={} removed={}", user_id, removed);
        Ok(())
    }

    /// Mint a new access token from a still-active refresh token.
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<String, AuthError> {
        let raw = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthorized("Invalid refresh token"))?;

        let claims = self.codec.verify_refresh(raw)?;
        let user_id: Uuid = claims.sub.parse().map_err(|_| AuthError::Invalid)?;

        let user = self
            .sessions
            .find_by_digest(user_id, &self.vault.hash(raw))
            .await?
            .ok_or(AuthError::Unauthorized("Unauthorized"))?;

        tracing::debug!("refresh: user_id={}", user.id);
        Ok(self.codec.issue_access(&user)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserStore;
    use crate::models::user::UserRole;

    fn service() -> (AuthService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let svc = AuthService::new(
            store.clone(),
            Arc::new(TokenCodec::new("access", "refresh", 900, 86400)),
            TokenVault::new("hash").unwrap(),
            4,
        );
        (svc, store)
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: "pw".into(),
            role: UserRole::Client,
        }
    }

    async fn session_count(store: &MemoryUserStore, id: Uuid) -> usize {
        store.find_by_id(id).await.unwrap().unwrap().sessions.len()
    }

    #[tokio::test]
    async fn test_register_opens_one_session() {
        let (svc, store) = service();
        let issued = svc.register(register_req("a@b.com")).await.unwrap();

        let user = store.find_by_id(issued.user.id).await.unwrap().unwrap();
        let digest = svc.vault.hash(&issued.refresh_token);
        assert_eq!(user.sessions.iter().filter(|s| s.token == digest).count(), 1);
        assert_ne!(user.password_hash, "pw");
        assert_ne!(digest, issued.refresh_token);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let (svc, _) = service();
        svc.register(register_req("a@b.com")).await.unwrap();
        let dup = svc.register(register_req("a@b.com")).await;
        assert!(matches!(dup, Err(AuthError::Conflict)));
    }

    #[tokio::test]
    async fn test_login_issues_matching_access_token() {
        let (svc, store) = service();
        let registered = svc.register(register_req("a@b.com")).await.unwrap();

        let issued = svc.login("a@b.com", "pw").await.unwrap();
        let principal = svc.codec().verify_access(&issued.access_token).unwrap();
        assert_eq!(principal.user_id, registered.user.id);
        assert_eq!(principal.email, "a@b.com");
        assert_eq!(principal.role, UserRole::Client);
        assert_eq!(session_count(&store, registered.user.id).await, 2);
    }

    #[tokio::test]
    async fn test_login_failures_are_generic_and_do_not_mutate() {
        let (svc, store) = service();
        let registered = svc.register(register_req("a@b.com")).await.unwrap();

        let wrong_password = svc.login("a@b.com", "nope").await.unwrap_err();
        let unknown_email = svc.login("z@b.com", "pw").await.unwrap_err();
        assert_eq!(wrong_password.to_string(), "Invalid email or password");
        assert_eq!(unknown_email.to_string(), "Invalid email or password");
        assert_eq!(session_count(&store, registered.user.id).await, 1);
    }

    #[tokio::test]
    async fn test_logout_removes_only_that_device() {
        let (svc, store) = service();
        let first = svc.register(register_req("a@b.com")).await.unwrap();
        let second = svc.login("a@b.com", "pw").await.unwrap();
        let id = first.user.id;

        svc.logout(id, Some(&first.refresh_token)).await.unwrap();
        assert_eq!(session_count(&store, id).await, 1);

        svc.logout(id, Some(&first.refresh_token)).await.unwrap();
        svc.logout(id, None).await.unwrap();
        assert_eq!(session_count(&store, id).await, 1);

        assert!(svc.refresh(Some(&second.refresh_token)).await.is_ok());
        assert!(matches!(
            svc.refresh(Some(&first.refresh_token)).await,
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_for_vanished_user() {
        let (svc, _) = service();
        let ghost = Uuid::new_v4();
        assert!(matches!(svc.logout(ghost, None).await, Err(AuthError::NotFound)));
        assert!(matches!(svc.logout(ghost, Some("tok")).await, Err(AuthError::NotFound)));
        assert!(matches!(svc.logout_all(ghost).await, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn test_refresh_errors() {
        let (svc, _) = service();
        let issued = svc.register(register_req("a@b.com")).await.unwrap();

        assert!(matches!(svc.refresh(None).await, Err(AuthError::Unauthorized(_))));
        assert!(matches!(svc.refresh(Some("")).await, Err(AuthError::Unauthorized(_))));
        assert!(matches!(svc.refresh(Some("garbage")).await, Err(AuthError::Invalid)));
        // an access token is signed with the wrong secret for this flow
        assert!(matches!(
            svc.refresh(Some(&issued.access_token)).await,
            Err(AuthError::Invalid)
        ));

        let expired = svc.codec().issue_refresh_at(&issued.user.id, 0).unwrap();
        assert!(matches!(svc.refresh(Some(&expired)).await, Err(AuthError::Expired)));
    }

    #[tokio::test]
    async fn test_refresh_reflects_current_role() {
        let (svc, store) = service();
        let issued = svc.register(register_req("a@b.com")).await.unwrap();

        let mut user = store.find_by_id(issued.user.id).await.unwrap().unwrap();
        user.role = UserRole::Manager;
        store.save(&user).await.unwrap();

        let access = svc.refresh(Some(&issued.refresh_token)).await.unwrap();
        let principal = svc.codec().verify_access(&access).unwrap();
        assert_eq!(principal.role, UserRole::Manager);
    }

    #[tokio::test]
    async fn test_logout_all_revokes_every_refresh_token() {
        let (svc, store) = service();
        let a = svc.register(register_req("a@b.com")).await.unwrap();
        let b = svc.login("a@b.com", "pw").await.unwrap();

        svc.logout_all(a.user.id).await.unwrap();
        assert_eq!(session_count(&store, a.user.id).await, 0);
        for token in [&a.refresh_token, &b.refresh_token] {
            assert!(matches!(
                svc.refresh(Some(token)).await,
                Err(AuthError::Unauthorized(_))
            ));
        }
    }
}
