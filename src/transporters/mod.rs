mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

use axum::{middleware::from_fn_with_state, Router};

use crate::{
    auth::{
        middleware::require_role,
        roles::{ADMIN_ONLY, ALL_ROLES},
    },
    state::AppState,
};

/// Anyone signed in may list transporters; only admins change them.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes().route_layer(from_fn_with_state(ALL_ROLES, require_role)))
        .merge(handlers::write_routes().route_layer(from_fn_with_state(ADMIN_ONLY, require_role)))
}
