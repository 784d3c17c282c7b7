mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

use axum::{middleware::from_fn_with_state, Router};

use crate::{
    auth::{middleware::require_role, roles::ALL_ROLES},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    handlers::routes().route_layer(from_fn_with_state(ALL_ROLES, require_role))
}
