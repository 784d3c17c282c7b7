use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::roles::Role;

/// Body of `GET /api/user`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub uid: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    /// The backend refused the token; the session must end.
    #[error("backend rejected the session token")]
    Unauthorized,
    #[error("profile request failed with status {0}")]
    Status(u16),
    #[error("profile request failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn current_user(&self, token: &str) -> Result<Profile, ProfileError>;
}

/// Talks to a running backend over HTTP.
pub struct HttpProfileApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpProfileApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ProfileApi for HttpProfileApi {
    async fn current_user(&self, token: &str) -> Result<Profile, ProfileError> {
        let res = self
            .http
            .get(format!("{}/api/user", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProfileError::Transport(e.to_string()))?;

        match res.status() {
            StatusCode::UNAUTHORIZED => Err(ProfileError::Unauthorized),
            s if !s.is_success() => Err(ProfileError::Status(s.as_u16())),
            _ => res
                .json::<Profile>()
                .await
                .map_err(|e| ProfileError::Transport(e.to_string())),
        }
    }
}
