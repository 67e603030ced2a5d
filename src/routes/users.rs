use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AuthError,
    models::user::{AssignRoleRequest, RegisterRequest},
    routes::{parse_body, parse_user_id},
    services::users::UserService,
};

// Unknown ids are reported as a bad request on this surface.
fn missing_as_bad_request(e: AuthError) -> AuthError {
    match e {
        AuthError::NotFound => AuthError::Validation("User not found".into()),
        other => other,
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AuthError> {
    let body = parse_body(body)?;
    body.validate().map_err(AuthError::Validation)?;
    let user = UserService::create(&state.auth, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully.", "user": user })),
    ))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, AuthError> {
    let users = UserService::list(&state.auth).await?;
    Ok(Json(json!({ "message": "Users fetched successfully.", "users": users })))
}

pub async fn assign_role(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<AssignRoleRequest>, JsonRejection>,
) -> Result<Json<Value>, AuthError> {
    let id = parse_user_id(id)?;
    let body = parse_body(body)?;
    let user = UserService::assign_role(&state.auth, id, body.role)
        .await
        .map_err(missing_as_bad_request)?;
    Ok(Json(json!({ "message": "Role assigned successfully.", "user": user })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AuthError> {
    let id = parse_user_id(id)?;
    let user = UserService::delete(&state.auth, id)
        .await
        .map_err(missing_as_bad_request)?;
    Ok(Json(json!({ "message": "User deleted successfully.", "user": user })))
}
