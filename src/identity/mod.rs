//! Client side of the managed identity service.
//!
//! The backend never checks credentials or signs tokens itself; everything
//! about an account's existence, password and role claim is delegated to an
//! [`IdentityProvider`].

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::roles::Role;

pub mod firebase;

#[cfg(test)]
pub mod fake;

pub use firebase::FirebaseIdentity;

/// Subject of a successfully verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject_id: String,
}

/// The `role` custom claim as the provider stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleClaim {
    Absent,
    Known(Role),
    /// Set, but not a role this service knows. Never defaulted.
    Unrecognised(String),
}

impl From<Option<Role>> for RoleClaim {
    fn from(role: Option<Role>) -> Self {
        role.map_or(RoleClaim::Absent, RoleClaim::Known)
    }
}

/// Account attributes as currently stored by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub subject_id: String,
    pub email: String,
    pub role_claim: RoleClaim,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("unrecognised role claim `{0}`")]
    UnrecognisedRole(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("could not create user: {0}")]
    CreateFailed(String),
    #[error("could not update role claim: {0}")]
    ClaimUpdateFailed(String),
    #[error("could not delete user: {0}")]
    DeleteFailed(String),
    #[error("could not generate password reset link: {0}")]
    ResetLinkFailed(String),
    #[error("identity provider unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, IdentityError>;
    async fn get_user(&self, subject_id: &str) -> Result<IdentityUser, IdentityError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<IdentityUser>, IdentityError>;
    async fn create_user(&self, email: &str, password: &str)
        -> Result<IdentityUser, IdentityError>;
    async fn set_role_claim(&self, subject_id: &str, role: Role) -> Result<(), IdentityError>;
    async fn delete_user(&self, subject_id: &str) -> Result<(), IdentityError>;
    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityError>;
}
