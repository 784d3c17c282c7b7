//! Request guards: `verify_token` establishes who is calling, `require_role`
//! decides whether that caller may reach the handler.
//!
//! Both are installed with `axum::middleware::from_fn_with_state`; the
//! verification layer must wrap the role gate so an [`Identity`] is present
//! in the request extensions when the gate runs.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};

use super::roles::{Identity, Role};
use crate::{
    error::ApiError,
    identity::{IdentityError, IdentityProvider, RoleClaim},
    state::AppState,
};

pub const NO_TOKEN: &str = "No token provided";
pub const INVALID_TOKEN: &str = "Invalid token";
pub const INSUFFICIENT_PERMISSIONS: &str = "Insufficient permissions";

/// Returns the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Verifies `token` and loads the account's current attributes. The role is
/// read fresh from the provider rather than from the token, since the claim
/// may have changed after the token was issued.
pub async fn resolve_identity(
    provider: &dyn IdentityProvider,
    token: &str,
) -> Result<Identity, IdentityError> {
    let verified = provider.verify_token(token).await?;
    let user = provider.get_user(&verified.subject_id).await?;
    let role = match user.role_claim {
        RoleClaim::Known(role) => role,
        RoleClaim::Absent => Role::LEAST_PRIVILEGED,
        RoleClaim::Unrecognised(raw) => return Err(IdentityError::UnrecognisedRole(raw)),
    };
    Ok(Identity {
        id: user.subject_id,
        email: user.email,
        role,
    })
}

pub async fn verify_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .ok_or(ApiError::Unauthenticated(NO_TOKEN))?;

    let identity = resolve_identity(state.identity.as_ref(), &token)
        .await
        .map_err(|e| {
            warn!(error = %e, "token verification failed");
            ApiError::Unauthenticated(INVALID_TOKEN)
        })?;

    debug!(user_id = %identity.id, role = %identity.role, "request authenticated");
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// The role decision on its own; no I/O.
pub fn authorize(identity: &Identity, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(INSUFFICIENT_PERMISSIONS))
    }
}

pub async fn require_role(
    State(allowed): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(identity) = request.extensions().get::<Identity>() else {
        error!("role gate reached without a verified identity");
        return Err(ApiError::Dependency("Internal server error"));
    };

    if let Err(e) = authorize(identity, allowed) {
        warn!(user_id = %identity.id, role = %identity.role, ?allowed, "role not permitted");
        return Err(e);
    }

    Ok(next.run(request).await)
}
