mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use axum::{middleware::from_fn_with_state, Router};

use crate::{
    auth::{
        middleware::require_role,
        roles::{ADMIN_ONLY, ALL_ROLES},
    },
    state::AppState,
};

/// User management is admin-only; deletion finishes its role check in the
/// handler.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::admin_routes().route_layer(from_fn_with_state(ADMIN_ONLY, require_role)))
        .merge(handlers::delete_routes().route_layer(from_fn_with_state(ALL_ROLES, require_role)))
}
