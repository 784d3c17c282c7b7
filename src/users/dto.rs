use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::repo_types::User;
use crate::{auth::roles::Role, error::ApiError, validate::non_empty};

// the provider refuses anything shorter
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// A create request that passed validation.
#[derive(Debug)]
pub struct ValidCreateUser {
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<ValidCreateUser, ApiError> {
        let (Some(email), Some(password), Some(role)) = (
            non_empty(self.email),
            self.password.filter(|p| !p.is_empty()),
            non_empty(self.role),
        ) else {
            return Err(ApiError::validation("Email, password, and role are required"));
        };

        let role = parse_role(&role)?;
        let email = email.to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::validation("Invalid email"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(ValidCreateUser {
            email,
            password,
            role,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Option<String>,
}

impl UpdateRoleRequest {
    pub fn validate(self) -> Result<Role, ApiError> {
        parse_role(self.role.as_deref().unwrap_or_default())
    }
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::validation("Invalid role"))
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetLinkResponse {
    pub message: &'static str,
    pub reset_link: String,
}
