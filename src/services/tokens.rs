use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::models::auth::{AccessClaims, Principal, RefreshClaims};
use crate::models::user::User;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("failed to sign token: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Signs and verifies HS256 access and refresh tokens.
///
/// Access and refresh tokens use independent secrets. Expiry is judged
/// against the caller's clock reading only; nothing here consults the store.
pub struct TokenCodec {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl TokenCodec {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_seconds: u64,
        refresh_ttl_seconds: u64,
    ) -> Self {
        Self {
            access: KeyPair::from_secret(access_secret),
            refresh: KeyPair::from_secret(refresh_secret),
            access_ttl: i64::try_from(access_ttl_seconds).unwrap_or(i64::MAX),
            refresh_ttl: i64::try_from(refresh_ttl_seconds).unwrap_or(i64::MAX),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.access_token_secret,
            &config.refresh_token_secret,
            config.access_token_ttl_seconds,
            config.refresh_token_ttl_seconds,
        )
    }

    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl
    }

    pub fn issue_access(&self, user: &User) -> Result<String, TokenError> {
        self.issue_access_at(user, Utc::now().timestamp())
    }

    pub fn issue_access_at(&self, user: &User, now: i64) -> Result<String, TokenError> {
        let claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now.saturating_add(self.access_ttl),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.access.encoding)?)
    }

    pub fn issue_refresh(&self, user_id: &Uuid) -> Result<String, TokenError> {
        self.issue_refresh_at(user_id, Utc::now().timestamp())
    }

    pub fn issue_refresh_at(&self, user_id: &Uuid, now: i64) -> Result<String, TokenError> {
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(self.refresh_ttl),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.refresh.encoding)?)
    }

    pub fn verify_access(&self, token: &str) -> Result<Principal, TokenError> {
        self.verify_access_at(token, Utc::now().timestamp())
    }

    pub fn verify_access_at(&self, token: &str, now: i64) -> Result<Principal, TokenError> {
        let claims: AccessClaims = verify(token, &self.access.decoding, now, |c: &AccessClaims| c.exp)?;
        Ok(Principal {
            user_id: claims.sub.parse().map_err(|_| TokenError::Invalid)?,
            email: claims.email,
            role: claims.role,
        })
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.verify_refresh_at(token, Utc::now().timestamp())
    }

    pub fn verify_refresh_at(&self, token: &str, now: i64) -> Result<RefreshClaims, TokenError> {
        verify(token, &self.refresh.decoding, now, |c: &RefreshClaims| c.exp)
    }
}

/// Checks the signature first, then expiry: a token is expired once `now >= exp`.
fn verify<C, F>(token: &str, key: &DecodingKey, now: i64, exp_of: F) -> Result<C, TokenError>
where
    C: DeserializeOwned,
    F: Fn(&C) -> i64,
{
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;

    let data = decode::<C>(token, key, &validation).map_err(|_| TokenError::Invalid)?;
    if now >= exp_of(&data.claims) {
        return Err(TokenError::Expired);
    }
    Ok(data.claims)
}
