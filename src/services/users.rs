use uuid::Uuid;

use crate::{
    error::AuthError,
    models::user::{NewUser, PublicUser, RegisterRequest, UserRole},
    services::auth::AuthService,
};

/// Admin-side user management. Does not touch sessions except by deleting
/// the whole record.
pub struct UserService;

impl UserService {
    pub async fn create(auth: &AuthService, req: RegisterRequest) -> Result<PublicUser, AuthError> {
        let password_hash = auth.hash_password(&req.password)?;
        let user = auth
            .store()
            .insert(NewUser {
                email: req.email.trim().to_string(),
                password_hash,
                role: req.role,
            })
            .await?;
        tracing::info!("admin: created user_id={} role={}", user.id, user.role);
        Ok(user.into())
    }

    pub async fn list(auth: &AuthService) -> Result<Vec<PublicUser>, AuthError> {
        let users = auth.store().list().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn assign_role(
        auth: &AuthService,
        id: Uuid,
        role: UserRole,
    ) -> Result<PublicUser, AuthError> {
        let mut user = auth
            .store()
            .find_by_id(id)
            .await?
            .ok_or(AuthError::NotFound)?;
        user.role = role;
        auth.store().save(&user).await?;
        tracing::info!("admin: user_id={} role set to {}", id, role);
        Ok(user.into())
    }

    pub async fn delete(auth: &AuthService, id: Uuid) -> Result<PublicUser, AuthError> {
        let user = auth
            .store()
            .delete(id)
            .await?
            .ok_or(AuthError::NotFound)?;
        tracing::info!("admin: deleted user_id={}", id);
        Ok(user.into())
    }
}
