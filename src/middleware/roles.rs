use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::GateRejection;
use crate::models::auth::Principal;
use crate::models::user::UserRole;

/// Roles permitted past an `enforce_roles` stage.
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [UserRole]);

/// Allow only when a principal is attached and its role is in `permitted`.
pub fn check_roles(permitted: &[UserRole], principal: Option<&Principal>) -> Result<(), GateRejection> {
    match principal {
        Some(p) if permitted.contains(&p.role) => Ok(()),
        _ => Err(GateRejection::Forbidden),
    }
}

/// Pipeline stage that must sit behind `require_auth`; without an attached
/// principal it rejects.
pub async fn enforce_roles(
    State(AllowedRoles(permitted)): State<AllowedRoles>,
    req: Request,
    next: Next,
) -> Result<Response, GateRejection> {
    let principal = req.extensions().get::<Principal>();
    if let Err(rejection) = check_roles(permitted, principal) {
        tracing::debug!(
            "role gate rejected {}: role={:?} permitted={:?}",
            req.uri().path(),
            principal.map(|p| p.role),
            permitted
        );
        return Err(rejection);
    }
    Ok(next.run(req).await)
}
