use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header, encode,
    jwk::{Jwk, JwkSet},
    Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{IdentityError, IdentityProvider, IdentityUser, RoleClaim, VerifiedToken};
use crate::{auth::roles::Role, config::FirebaseConfig};

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const ADMIN_SCOPE: &str = "https://www.googleapis.com/auth/identitytoolkit";
const KEYS_TTL: Duration = Duration::from_secs(60 * 60);
// an unknown kid refetches the key set, but at most this often
const KEYS_MIN_REFETCH: Duration = Duration::from_secs(30);
const ASSERTION_TTL_SECS: i64 = 60 * 60;
// refresh the access token this long before Google expires it
const ACCESS_TOKEN_SLACK: Duration = Duration::from_secs(60);

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

#[derive(Debug)]
enum KeyLookup {
    Found(Jwk),
    Refetch,
    Unknown,
}

impl CachedKeys {
    /// Google rotates keys well before `KEYS_TTL` runs out, so a kid missing
    /// from a set older than `KEYS_MIN_REFETCH` asks for a refetch.
    fn lookup(&self, kid: &str, age: Duration) -> KeyLookup {
        if age >= KEYS_TTL {
            return KeyLookup::Refetch;
        }
        match self.set.find(kid) {
            Some(jwk) => KeyLookup::Found(jwk.clone()),
            None if age >= KEYS_MIN_REFETCH => KeyLookup::Refetch,
            None => KeyLookup::Unknown,
        }
    }
}

struct CachedAccessToken {
    token: String,
    expires_at: Instant,
}

/// Firebase Authentication via Google's public signing keys (token checks)
/// and the Identity Toolkit admin REST API (account management).
pub struct FirebaseIdentity {
    http: reqwest::Client,
    config: FirebaseConfig,
    signing_key: EncodingKey,
    keys: RwLock<Option<CachedKeys>>,
    access_token: RwLock<Option<CachedAccessToken>>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    custom_attributes: Option<String>,
}

impl AccountRecord {
    fn into_user(self) -> IdentityUser {
        IdentityUser {
            role_claim: role_from_attributes(self.custom_attributes.as_deref()),
            subject_id: self.local_id,
            email: self.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OobResponse {
    oob_link: String,
}

#[derive(Debug, Deserialize)]
struct EmptyResponse {}

#[derive(Debug, Deserialize)]
struct ToolkitErrorBody {
    error: ToolkitErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ToolkitErrorDetail {
    message: String,
}

impl FirebaseIdentity {
    pub fn new(config: FirebaseConfig, timeout: Duration) -> anyhow::Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .context("parse service account private key")?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build identity http client")?;
        Ok(Self {
            http,
            config,
            signing_key,
            keys: RwLock::new(None),
            access_token: RwLock::new(None),
        })
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.config.project_id)
    }

    async fn signing_key(&self, kid: &str) -> Result<Jwk, IdentityError> {
        let cached = self
            .keys
            .read()
            .await
            .as_ref()
            .map(|c| c.lookup(kid, c.fetched_at.elapsed()));
        match cached {
            Some(KeyLookup::Found(jwk)) => return Ok(jwk),
            Some(KeyLookup::Unknown) => return Err(unknown_kid(kid)),
            Some(KeyLookup::Refetch) | None => {}
        }

        let set: JwkSet = self
            .http
            .get(JWKS_URL)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;
        debug!(keys = set.keys.len(), "refreshed identity signing keys");

        let jwk = set.find(kid).cloned();
        *self.keys.write().await = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });
        jwk.ok_or_else(|| unknown_kid(kid))
    }

    async fn admin_token(&self) -> Result<String, IdentityError> {
        if let Some(cached) = self.access_token.read().await.as_ref() {
            if Instant::now() + ACCESS_TOKEN_SLACK < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = AssertionClaims {
            iss: &self.config.client_email,
            scope: ADMIN_SCOPE,
            aud: &self.config.token_uri,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| IdentityError::Transport(format!("sign assertion: {e}")))?;

        let resp: AccessTokenResponse = self
            .http
            .post(&self.config.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        let token = resp.access_token.clone();
        *self.access_token.write().await = Some(CachedAccessToken {
            token: resp.access_token,
            expires_at: Instant::now() + Duration::from_secs(resp.expires_in),
        });
        Ok(token)
    }

    /// POSTs to an Identity Toolkit project endpoint. `Err(String)` carries the
    /// provider's error code (e.g. `EMAIL_EXISTS`) so callers can pick the
    /// matching [`IdentityError`] variant.
    async fn toolkit<B, R>(&self, action: &str, body: &B) -> Result<R, ToolkitFailure>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let token = self.admin_token().await.map_err(ToolkitFailure::Identity)?;
        let url = format!(
            "{TOOLKIT_URL}/projects/{}/{action}",
            self.config.project_id
        );
        let resp = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| ToolkitFailure::Identity(transport(e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ToolkitErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(ToolkitFailure::Rejected(reason));
        }

        resp.json::<R>()
            .await
            .map_err(|e| ToolkitFailure::Identity(transport(e)))
    }
}

enum ToolkitFailure {
    Identity(IdentityError),
    Rejected(String),
}

impl ToolkitFailure {
    fn or(self, variant: fn(String) -> IdentityError) -> IdentityError {
        match self {
            ToolkitFailure::Identity(e) => e,
            ToolkitFailure::Rejected(reason) => variant(reason),
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, IdentityError> {
        let header = decode_header(token).map_err(invalid)?;
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("missing kid".into()))?;

        let jwk = self.signing_key(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(invalid)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(std::slice::from_ref(&self.config.project_id));
        validation.set_issuer(&[self.issuer()]);

        let data = decode::<IdTokenClaims>(token, &key, &validation).map_err(invalid)?;
        if data.claims.sub.is_empty() {
            return Err(IdentityError::InvalidToken("empty subject".into()));
        }
        Ok(VerifiedToken {
            subject_id: data.claims.sub,
        })
    }

    #[instrument(skip(self))]
    async fn get_user(&self, subject_id: &str) -> Result<IdentityUser, IdentityError> {
        let resp: LookupResponse = self
            .toolkit("accounts:lookup", &serde_json::json!({ "localId": [subject_id] }))
            .await
            .map_err(|f| f.or(IdentityError::UserNotFound))?;
        resp.users
            .into_iter()
            .next()
            .map(AccountRecord::into_user)
            .ok_or_else(|| IdentityError::UserNotFound(subject_id.to_string()))
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<IdentityUser>, IdentityError> {
        let resp: LookupResponse = self
            .toolkit("accounts:lookup", &serde_json::json!({ "email": [email] }))
            .await
            .map_err(|f| f.or(IdentityError::Transport))?;
        Ok(resp.users.into_iter().next().map(AccountRecord::into_user))
    }

    #[instrument(skip(self, password))]
    async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityUser, IdentityError> {
        let resp: SignUpResponse = self
            .toolkit(
                "accounts",
                &serde_json::json!({
                    "email": email,
                    "password": password,
                    "emailVerified": true,
                }),
            )
            .await
            .map_err(|f| f.or(IdentityError::CreateFailed))?;
        Ok(IdentityUser {
            subject_id: resp.local_id,
            email: resp.email.unwrap_or_else(|| email.to_string()),
            role_claim: RoleClaim::Absent,
        })
    }

    #[instrument(skip(self))]
    async fn set_role_claim(&self, subject_id: &str, role: Role) -> Result<(), IdentityError> {
        let attributes = serde_json::json!({ "role": role }).to_string();
        let _: EmptyResponse = self
            .toolkit(
                "accounts:update",
                &serde_json::json!({
                    "localId": subject_id,
                    "customAttributes": attributes,
                }),
            )
            .await
            .map_err(|f| f.or(IdentityError::ClaimUpdateFailed))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, subject_id: &str) -> Result<(), IdentityError> {
        let _: EmptyResponse = self
            .toolkit("accounts:delete", &serde_json::json!({ "localId": subject_id }))
            .await
            .map_err(|f| f.or(IdentityError::DeleteFailed))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityError> {
        let resp: OobResponse = self
            .toolkit(
                "accounts:sendOobCode",
                &serde_json::json!({
                    "requestType": "PASSWORD_RESET",
                    "email": email,
                    "returnOobLink": true,
                }),
            )
            .await
            .map_err(|f| f.or(IdentityError::ResetLinkFailed))?;
        Ok(resp.oob_link)
    }
}

/// Reads the `role` custom claim. Only a missing claim is [`RoleClaim::Absent`];
/// anything set but unparseable stays [`RoleClaim::Unrecognised`].
fn role_from_attributes(raw: Option<&str>) -> RoleClaim {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return RoleClaim::Absent;
    };
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return RoleClaim::Unrecognised(raw.to_string()),
    };
    match value.get("role") {
        None | Some(serde_json::Value::Null) => RoleClaim::Absent,
        Some(serde_json::Value::String(s)) => s
            .parse()
            .map(RoleClaim::Known)
            .unwrap_or_else(|_| RoleClaim::Unrecognised(s.clone())),
        Some(other) => RoleClaim::Unrecognised(other.to_string()),
    }
}

fn transport(e: reqwest::Error) -> IdentityError {
    IdentityError::Transport(e.to_string())
}

fn unknown_kid(kid: &str) -> IdentityError {
    IdentityError::InvalidToken(format!("unknown kid {kid}"))
}

fn invalid(e: jsonwebtoken::errors::Error) -> IdentityError {
    IdentityError::InvalidToken(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_claim_is_read_from_custom_attributes() {
        assert_eq!(
            role_from_attributes(Some(r#"{"role":"admin"}"#)),
            RoleClaim::Known(Role::Admin)
        );
        assert_eq!(
            role_from_attributes(Some(r#"{"role":"management_staff","team":"north"}"#)),
            RoleClaim::Known(Role::ManagementStaff)
        );
    }

    #[test]
    fn missing_role_claim_is_absent() {
        assert_eq!(role_from_attributes(None), RoleClaim::Absent);
        assert_eq!(role_from_attributes(Some("")), RoleClaim::Absent);
        assert_eq!(role_from_attributes(Some("{}")), RoleClaim::Absent);
        assert_eq!(role_from_attributes(Some(r#"{"role":null}"#)), RoleClaim::Absent);
    }

    #[test]
    fn unknown_role_claim_is_kept_as_unrecognised() {
        assert_eq!(
            role_from_attributes(Some(r#"{"role":"superuser"}"#)),
            RoleClaim::Unrecognised("superuser".into())
        );
        assert_eq!(
            role_from_attributes(Some(r#"{"role":5}"#)),
            RoleClaim::Unrecognised("5".into())
        );
        assert!(matches!(
            role_from_attributes(Some("not json")),
            RoleClaim::Unrecognised(_)
        ));
    }

    #[test]
    fn lookup_response_maps_to_identity_user() {
        let raw = r#"{
            "users": [{
                "localId": "uid-1",
                "email": "ops@shipwise.test",
                "customAttributes": "{\"role\":\"admin\"}"
            }]
        }"#;
        let resp: LookupResponse = serde_json::from_str(raw).unwrap();
        let user = resp.users.into_iter().next().unwrap().into_user();
        assert_eq!(user.subject_id, "uid-1");
        assert_eq!(user.email, "ops@shipwise.test");
        assert_eq!(user.role_claim, RoleClaim::Known(Role::Admin));
    }

    fn cached(kids: &[&str]) -> CachedKeys {
        let keys: Vec<_> = kids
            .iter()
            .map(|kid| {
                serde_json::json!({
                    "kty": "RSA",
                    "kid": kid,
                    "alg": "RS256",
                    "use": "sig",
                    "n": "u1SU1LfVLPHCozMxH2Mo4lgOEePzNm0tRgeLezV6ffAt0gunVTLw7onLRnrq0_IzW7yWR7QkrmBL7jTKEn5u-qKhbwKfBstIs-bMY2Zkp18gnTxKLxoS2tFczGkPLPgizskuemMghRniWaoLcyehkd3qqGElvW_VDL5AaWTg0nLVkjRo9z-40RQzuVaE8AkAFmxZzow3x-VJYKdjykkJ0iT9wCS0DRTXu269V264Vf_3jvredZiKRkgwlL9xNAwxXFg0x_XFw005UWVRIkdgcKWTjpBP2dPwVZ4WWC-9aGVd-Gyn1o0CLelf4rEjGoXbAAEgAqeGUxrcIlbjXfbcmw",
                    "e": "AQAB"
                })
            })
            .collect();
        CachedKeys {
            set: serde_json::from_value(serde_json::json!({ "keys": keys })).unwrap(),
            fetched_at: Instant::now(),
        }
    }

    #[test]
    fn known_kid_is_served_from_cache() {
        let keys = cached(&["k1"]);
        assert!(matches!(
            keys.lookup("k1", Duration::from_secs(5)),
            KeyLookup::Found(jwk) if jwk.common.key_id.as_deref() == Some("k1")
        ));
    }

    #[test]
    fn rotated_kid_triggers_one_refetch() {
        let keys = cached(&["k1"]);
        assert!(matches!(
            keys.lookup("k2", Duration::from_secs(5 * 60)),
            KeyLookup::Refetch
        ));
        // just refetched and still missing: the token is bad, not the cache
        assert!(matches!(keys.lookup("k2", Duration::from_secs(1)), KeyLookup::Unknown));
    }

    #[test]
    fn expired_key_set_is_refetched() {
        let keys = cached(&["k1"]);
        assert!(matches!(keys.lookup("k1", KEYS_TTL), KeyLookup::Refetch));
    }

    #[test]
    fn empty_lookup_has_no_users() {
        let resp: LookupResponse = serde_json::from_str(r#"{"kind":"lookup"}"#).unwrap();
        assert!(resp.users.is_empty());
    }
}
