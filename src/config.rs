use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Service-account credentials for the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub firebase: FirebaseConfig,
    pub cors_origin: String,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub identity_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let firebase = FirebaseConfig::from_env()?;
        Ok(Self {
            database_url,
            firebase,
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 3000),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            identity_timeout_secs: env_or("IDENTITY_TIMEOUT_SECS", 10),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn identity_timeout(&self) -> Duration {
        Duration::from_secs(self.identity_timeout_secs)
    }
}

impl FirebaseConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            project_id: std::env::var("FIREBASE_PROJECT_ID")
                .context("FIREBASE_PROJECT_ID is not set")?,
            client_email: std::env::var("FIREBASE_CLIENT_EMAIL")
                .context("FIREBASE_CLIENT_EMAIL is not set")?,
            // .env files usually carry the PEM on one line with escaped newlines
            private_key: std::env::var("FIREBASE_PRIVATE_KEY")
                .context("FIREBASE_PRIVATE_KEY is not set")?
                .replace("\\n", "\n"),
            token_uri: std::env::var("FIREBASE_TOKEN_URI")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URI.into()),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
