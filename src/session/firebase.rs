use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};

use super::{AuthEvent, ProviderUser, SessionError, SignInProvider};

const SIGN_IN_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";

/// Password sign-in against Firebase Authentication's public REST API, the
/// same call the browser SDK makes. Holds at most one signed-in account.
pub struct FirebaseSignIn {
    http: reqwest::Client,
    api_key: String,
    signed_in: RwLock<Option<(ProviderUser, String)>>,
    events: broadcast::Sender<AuthEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl FirebaseSignIn {
    pub fn new(api_key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            signed_in: RwLock::new(None),
            events,
        }
    }
}

#[async_trait]
impl SignInProvider for FirebaseSignIn {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, SessionError> {
        let res = self
            .http
            .post(SIGN_IN_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| SessionError::SignIn(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let reason = res
                .json::<ErrorBody>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(SessionError::SignIn(reason));
        }

        let body: SignInResponse = res
            .json()
            .await
            .map_err(|e| SessionError::SignIn(e.to_string()))?;
        let user = ProviderUser {
            uid: body.local_id,
            email: body.email,
        };
        *self.signed_in.write().await = Some((user.clone(), body.id_token));
        // no subscribers is not an error
        let _ = self.events.send(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        *self.signed_in.write().await = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    async fn id_token(&self, user: &ProviderUser) -> Result<String, SessionError> {
        match self.signed_in.read().await.as_ref() {
            Some((current, token)) if current.uid == user.uid => Ok(token.clone()),
            _ => Err(SessionError::Token(format!("{} is not signed in", user.uid))),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
