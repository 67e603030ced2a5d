use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;
use crate::models::auth::Principal;
use crate::services::tokens::{TokenCodec, TokenError};

/// Why a request was turned away before reaching its handler. Always 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    NoToken,
    Expired,
    Invalid,
    Forbidden,
}

impl GateRejection {
    pub fn message(&self) -> &'static str {
        match self {
            GateRejection::NoToken => "No token provided",
            GateRejection::Expired => "Token expired",
            GateRejection::Invalid => "Invalid token",
            GateRejection::Forbidden => "Unauthorized access",
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        (StatusCode::FORBIDDEN, Json(json!({ "message": self.message() }))).into_response()
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`. Any other shape,
/// including a missing header, counts as no token. Whatever follows the single
/// space is handed to the codec as-is, so extra padding fails verification.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GateRejection> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(GateRejection::NoToken)
}

/// Stateless check of the access token; no store lookup.
pub fn authenticate(codec: &TokenCodec, headers: &HeaderMap) -> Result<Principal, GateRejection> {
    let token = bearer_token(headers)?;
    codec.verify_access(token).map_err(|e| match e {
        TokenError::Expired => GateRejection::Expired,
        _ => GateRejection::Invalid,
    })
}

/// Pipeline stage: verifies the access token and attaches the `Principal`
/// to the request extensions for later stages and handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateRejection> {
    let principal = authenticate(state.auth.codec(), req.headers()).map_err(|rejection| {
        tracing::debug!("auth gate rejected {} {}: {}", req.method(), req.uri().path(), rejection.message());
        rejection
    })?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Handlers read the principal that `require_auth` attached. Mounting a
/// handler without the gate makes every request fail closed.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(GateRejection::Forbidden)
    }
}
