use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::{
    app::AppState,
    error::AuthError,
    models::{
        auth::Principal,
        user::{LoginRequest, RegisterRequest},
    },
    routes::parse_body,
    services::auth::IssuedTokens,
};

pub const REFRESH_COOKIE: &str = "refreshToken";

const COOKIE_ATTRS: &str = "HttpOnly; Secure; SameSite=Strict; Path=/";

/// Extract a named cookie value from request headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|part| part.trim().strip_prefix(&prefix).map(str::to_string))
}

/// `Set-Cookie` value carrying the refresh token, valid for `ttl_seconds`.
pub fn refresh_cookie(token: &str, ttl_seconds: i64) -> String {
    let cookie = format!("{REFRESH_COOKIE}={token}; {COOKIE_ATTRS}; Max-Age={ttl_seconds}");
    // Max-Age alone is enough when the expiry date is not representable.
    match Duration::try_seconds(ttl_seconds).and_then(|ttl| Utc::now().checked_add_signed(ttl)) {
        Some(expires) => format!("{cookie}; Expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT")),
        None => cookie,
    }
}

/// Overwrites the refresh cookie with an empty value that expired in 1970.
pub fn cleared_refresh_cookie() -> String {
    format!("{REFRESH_COOKIE}=; {COOKIE_ATTRS}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT")
}

fn session_response(state: &AppState, issued: IssuedTokens, message: &str) -> Response {
    let cookie = refresh_cookie(&issued.refresh_token, state.auth.codec().refresh_ttl_seconds());
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "token": issued.access_token,
            "user": issued.user,
            "message": message,
        })),
    )
        .into_response()
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let body = parse_body(body)?;
    body.validate().map_err(AuthError::Validation)?;
    let issued = state.auth.register(body).await?;
    Ok(session_response(&state, issued, "User registered successfully"))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let body = parse_body(body)?;
    body.validate().map_err(AuthError::Validation)?;
    let issued = state.auth.login(&body.email, &body.password).await?;
    Ok(session_response(&state, issued, "Logged in successfully"))
}

pub async fn logout(
    State(state): State<AppState>,
    principal: Principal,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let refresh_token = get_cookie(&headers, REFRESH_COOKIE);
    state
        .auth
        .logout(principal.user_id, refresh_token.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cleared_refresh_cookie())],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response())
}

pub async fn logout_all(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Response, AuthError> {
    state.auth.logout_all(principal.user_id).await?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cleared_refresh_cookie())],
        Json(json!({ "message": "Logged out from all devices successfully" })),
    )
        .into_response())
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AuthError> {
    let refresh_token = get_cookie(&headers, REFRESH_COOKIE);
    let token = state.auth.refresh(refresh_token.as_deref()).await?;
    Ok(Json(json!({ "token": token })))
}
