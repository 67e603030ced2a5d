use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{
        auth::require_auth,
        roles::{enforce_roles, AllowedRoles},
    },
    models::user::UserRole,
    routes,
    services::auth::AuthService,
};

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
}

impl AppState {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }
}

pub fn router(state: AppState) -> Router {
    // Layers run outermost-last-added: the auth gate wraps the role gate.
    let gated_auth = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/logout-all", post(routes::auth::logout_all))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let auth = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh-auth", post(routes::auth::refresh))
        .merge(gated_auth);

    let users = Router::new()
        .route("/", get(routes::users::list_users).post(routes::users::create_user))
        .route("/{id}", put(routes::users::assign_role).delete(routes::users::delete_user))
        .route_layer(from_fn_with_state(AllowedRoles(ADMIN_ONLY), enforce_roles))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/auth", auth)
        .nest("/api/user", users)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
