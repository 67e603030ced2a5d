pub mod auth;
pub mod health;
pub mod users;

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path},
    Json,
};
use uuid::Uuid;

use crate::error::AuthError;

/// Unwraps a JSON body, turning any parse failure into a 400 that names the
/// offending field without echoing the deserializer's text.
pub fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let detail = rejection.body_text();
            tracing::debug!("rejected request body: {detail}");
            let message = if detail.contains("role") {
                "Role is required !"
            } else if detail.contains("email") {
                "Email is required !"
            } else if detail.contains("password") {
                "Password is required !"
            } else {
                "Invalid request body"
            };
            Err(AuthError::Validation(message.into()))
        }
    }
}

pub fn parse_user_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AuthError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!("rejected user id: {}", rejection.body_text());
        AuthError::Validation("Invalid user id".into())
    })
}
