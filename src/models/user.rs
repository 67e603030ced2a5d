use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Client,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Client => "client",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "client" => Ok(UserRole::Client),
            _ => Err(anyhow::anyhow!("Unknown role: {s}")),
        }
    }
}

/// One logged-in device. Only the vault digest of the refresh token is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub sessions: Vec<Session>,
}

impl User {
    pub fn has_session(&self, digest: &str) -> bool {
        self.sessions.iter().any(|s| s.token == digest)
    }
}

/// Fields needed to create a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// What clients get to see of a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            role: u.role,
        }
    }
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            role: u.role,
        }
    }
}

// Request DTOs
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: UserRole,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_credentials(&self.email, &self.password)
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_credentials(&self.email, &self.password)
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err("Email is required !".into());
    }
    if password.trim().is_empty() {
        return Err("Password is required !".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_text() {
        for role in [UserRole::Admin, UserRole::Manager, UserRole::Client] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_deserializes_lowercase() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@b.com","password":"pw","role":"manager"}"#).unwrap();
        assert_eq!(req.role, UserRole::Manager);

        let bad = serde_json::from_str::<RegisterRequest>(
            r#"{"email":"a@b.com","password":"pw","role":"root"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_credential_validation() {
        let ok = LoginRequest { email: "a@b.com".into(), password: "pw".into() };
        assert!(ok.validate().is_ok());

        let no_email = LoginRequest { email: "  ".into(), password: "pw".into() };
        assert_eq!(no_email.validate().unwrap_err(), "Email is required !");

        let bad_email = LoginRequest { email: "not-an-email".into(), password: "pw".into() };
        assert!(bad_email.validate().is_err());

        let blank_password = LoginRequest { email: "a@b.com".into(), password: "   ".into() };
        assert_eq!(blank_password.validate().unwrap_err(), "Password is required !");
    }
}
