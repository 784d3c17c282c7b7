//! Client-side session: the caller's view of who is signed in and what they
//! may see.
//!
//! This is a convenience for user interfaces only. The server re-checks every
//! request, so nothing here is a security boundary. An [`AuthSession`] is an
//! explicit object, created unauthenticated and torn down on sign-out; it
//! follows the identity provider through a broadcast channel of
//! [`AuthEvent`]s and exposes its state and navigation target through
//! `watch` channels.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::auth::roles::Role;

pub mod firebase;
pub mod profile;

pub use firebase::FirebaseSignIn;
pub use profile::{HttpProfileApi, Profile, ProfileApi, ProfileError};

/// An account as the provider's client SDK reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub uid: String,
    pub email: String,
}

/// Provider session changes, delivered once per change to each subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(ProviderUser),
    SignedOut,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("sign-in failed: {0}")]
    SignIn(String),
    #[error("sign-out failed: {0}")]
    SignOut(String),
    #[error("could not obtain id token: {0}")]
    Token(String),
}

/// The identity provider's client SDK.
#[async_trait]
pub trait SignInProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, SessionError>;
    async fn sign_out(&self) -> Result<(), SessionError>;
    async fn id_token(&self, user: &ProviderUser) -> Result<String, SessionError>;
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub current_user: Option<CurrentUser>,
    pub role: Option<Role>,
    pub token: Option<String>,
    /// True until the first provider event has been handled.
    pub loading: bool,
}

impl AuthState {
    fn initial() -> Self {
        Self {
            current_user: None,
            role: None,
            token: None,
            loading: true,
        }
    }

    fn signed_out() -> Self {
        Self {
            loading: false,
            ..Self::initial()
        }
    }

    /// Whether a role-gated view should render. No role means no access.
    pub fn has_access(&self, roles: &[Role]) -> bool {
        self.role.map_or(false, |r| roles.contains(&r))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn is_management_staff(&self) -> bool {
        self.role == Some(Role::ManagementStaff)
    }
}

/// Where the UI should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Landing,
    AdminDashboard,
    StaffDashboard,
}

impl Destination {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Destination::AdminDashboard,
            Role::ManagementStaff => Destination::StaffDashboard,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Destination::Landing => "/",
            Destination::AdminDashboard => "/admin/dashboard",
            Destination::StaffDashboard => "/staff/dashboard",
        }
    }
}

pub struct AuthSession {
    provider: Arc<dyn SignInProvider>,
    profile: Arc<dyn ProfileApi>,
    state: watch::Sender<AuthState>,
    navigation: watch::Sender<Option<Destination>>,
    // held while publishing a sign-in result or clearing the session
    transition: Mutex<()>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn SignInProvider>, profile: Arc<dyn ProfileApi>) -> Arc<Self> {
        Arc::new(Self {
            provider,
            profile,
            state: watch::Sender::new(AuthState::initial()),
            navigation: watch::Sender::new(None),
            transition: Mutex::new(()),
        })
    }

    /// Subscribes to provider events and handles them on a background task
    /// until the provider drops its sender.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.provider.subscribe();
        let session = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => session.handle_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth events dropped; continuing with the latest");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("auth event stream closed");
        })
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn watch_navigation(&self) -> watch::Receiver<Option<Destination>> {
        self.navigation.subscribe()
    }

    /// Checks credentials with the provider. The resulting `SignedIn` event
    /// fills in the role and picks the dashboard.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let user = self.provider.sign_in(email, password).await?;
        info!(uid = %user.uid, "signed in");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        let _transition = self.transition.lock().await;
        self.state.send_replace(AuthState::signed_out());
        self.provider.sign_out().await?;
        self.navigation.send_replace(Some(Destination::Landing));
        info!("signed out");
        Ok(())
    }

    pub async fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(user) => self.on_signed_in(user).await,
            AuthEvent::SignedOut => {
                let _transition = self.transition.lock().await;
                self.state.send_replace(AuthState::signed_out());
                self.navigation.send_if_modified(|dest| match dest {
                    Some(Destination::AdminDashboard | Destination::StaffDashboard) => {
                        *dest = Some(Destination::Landing);
                        true
                    }
                    _ => false,
                });
            }
        }
    }

    fn is_signed_in_as(&self, uid: &str) -> bool {
        self.state
            .borrow()
            .current_user
            .as_ref()
            .map_or(false, |u| u.uid == uid)
    }

    async fn on_signed_in(&self, user: ProviderUser) {
        self.state.send_modify(|s| {
            s.current_user = Some(CurrentUser {
                uid: user.uid.clone(),
                email: user.email.clone(),
            });
            s.role = None;
            s.token = None;
        });

        let token = match self.provider.id_token(&user).await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, uid = %user.uid, "no id token after sign-in");
                self.state.send_modify(|s| s.loading = false);
                return;
            }
        };

        match self.profile.current_user(&token).await {
            Ok(profile) => {
                let _transition = self.transition.lock().await;
                if !self.is_signed_in_as(&user.uid) {
                    debug!(uid = %user.uid, "session ended before the profile arrived");
                    return;
                }
                // navigation first: observers treat `loading == false` as settled
                self.navigation
                    .send_replace(Some(Destination::for_role(profile.role)));
                self.state.send_modify(|s| {
                    s.role = Some(profile.role);
                    s.token = Some(token);
                    s.loading = false;
                });
            }
            Err(ProfileError::Unauthorized) => {
                warn!(uid = %user.uid, "backend rejected token; signing out");
                self.state.send_modify(|s| s.loading = false);
                if let Err(e) = self.provider.sign_out().await {
                    warn!(error = %e, "forced sign-out failed");
                }
            }
            Err(e) => {
                warn!(error = %e, uid = %user.uid, "could not load profile; role left unset");
                self.state.send_modify(|s| s.loading = false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        time::Duration,
    };

    use super::*;

    struct FakeProvider {
        accounts: HashMap<String, (String, ProviderUser)>,
        events: broadcast::Sender<AuthEvent>,
        sign_outs: AtomicUsize,
    }

    impl FakeProvider {
        fn new() -> Self {
            let (events, _) = broadcast::channel(16);
            Self {
                accounts: HashMap::new(),
                events,
                sign_outs: AtomicUsize::new(0),
            }
        }

        fn with_account(mut self, email: &str, password: &str, uid: &str) -> Self {
            self.accounts.insert(
                email.into(),
                (password.into(), ProviderUser { uid: uid.into(), email: email.into() }),
            );
            self
        }
    }

    #[async_trait]
    impl SignInProvider for FakeProvider {
        async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, SessionError> {
            match self.accounts.get(email) {
                Some((pw, user)) if pw == password => {
                    let _ = self.events.send(AuthEvent::SignedIn(user.clone()));
                    Ok(user.clone())
                }
                _ => Err(SessionError::SignIn("INVALID_LOGIN_CREDENTIALS".into())),
            }
        }

        async fn sign_out(&self) -> Result<(), SessionError> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            let _ = self.events.send(AuthEvent::SignedOut);
            Ok(())
        }

        async fn id_token(&self, user: &ProviderUser) -> Result<String, SessionError> {
            Ok(format!("token-{}", user.uid))
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
            self.events.subscribe()
        }
    }

    #[derive(Default)]
    struct FakeProfile {
        by_token: Mutex<HashMap<String, Result<Role, u16>>>,
    }

    impl FakeProfile {
        fn answer(self, token: &str, result: Result<Role, u16>) -> Self {
            self.by_token.lock().unwrap().insert(token.into(), result);
            self
        }
    }

    #[async_trait]
    impl ProfileApi for FakeProfile {
        async fn current_user(&self, token: &str) -> Result<Profile, ProfileError> {
            let answer = self.by_token.lock().unwrap().get(token).cloned();
            match answer {
                Some(Ok(role)) => Ok(Profile {
                    uid: token.trim_start_matches("token-").into(),
                    email: "someone@shipwise.test".into(),
                    role,
                }),
                Some(Err(401)) => Err(ProfileError::Unauthorized),
                Some(Err(code)) => Err(ProfileError::Status(code)),
                None => Err(ProfileError::Transport("connection refused".into())),
            }
        }
    }

    async fn settled(session: &AuthSession) -> AuthState {
        let mut rx = session.watch_state();
        let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| !s.loading))
            .await
            .expect("session settled")
            .expect("state channel open")
            .clone();
        state
    }

    #[tokio::test]
    async fn starts_unauthenticated_and_loading() {
        let session = AuthSession::new(Arc::new(FakeProvider::new()), Arc::new(FakeProfile::default()));
        let state = session.state();
        assert!(state.loading);
        assert_eq!(state.current_user, None);
        assert!(!state.has_access(&[Role::Admin, Role::ManagementStaff]));
    }

    #[tokio::test]
    async fn login_resolves_role_and_redirects_admin() {
        let provider = Arc::new(FakeProvider::new().with_account("boss@shipwise.test", "secret1", "uid-a"));
        let profile = Arc::new(FakeProfile::default().answer("token-uid-a", Ok(Role::Admin)));
        let session = AuthSession::new(provider, profile);
        let _listener = session.start();

        session.login("boss@shipwise.test", "secret1").await.unwrap();
        let state = settled(&session).await;

        assert_eq!(state.role, Some(Role::Admin));
        assert_eq!(state.token.as_deref(), Some("token-uid-a"));
        assert_eq!(state.current_user.as_ref().map(|u| u.uid.as_str()), Some("uid-a"));
        assert!(state.is_admin());
        assert_eq!(
            session.watch_navigation().borrow().map(|d| d.path()),
            Some("/admin/dashboard")
        );
    }

    #[tokio::test]
    async fn staff_login_redirects_to_staff_dashboard() {
        let provider = Arc::new(FakeProvider::new().with_account("ops@shipwise.test", "secret1", "uid-s"));
        let profile = Arc::new(FakeProfile::default().answer("token-uid-s", Ok(Role::ManagementStaff)));
        let session = AuthSession::new(provider, profile);
        let _listener = session.start();

        session.login("ops@shipwise.test", "secret1").await.unwrap();
        let state = settled(&session).await;

        assert!(state.is_management_staff());
        assert!(!state.has_access(&[Role::Admin]));
        assert_eq!(*session.watch_navigation().borrow(), Some(Destination::StaffDashboard));
    }

    #[tokio::test]
    async fn wrong_password_is_reported() {
        let provider = Arc::new(FakeProvider::new().with_account("ops@shipwise.test", "secret1", "uid-s"));
        let session = AuthSession::new(provider, Arc::new(FakeProfile::default()));
        let err = session.login("ops@shipwise.test", "nope").await.unwrap_err();
        assert!(matches!(err, SessionError::SignIn(_)));
        assert_eq!(session.state().current_user, None);
    }

    #[tokio::test]
    async fn unauthorized_profile_forces_sign_out() {
        let provider = Arc::new(FakeProvider::new().with_account("old@shipwise.test", "secret1", "uid-o"));
        let profile = Arc::new(FakeProfile::default().answer("token-uid-o", Err(401)));
        let session = AuthSession::new(provider.clone(), profile);

        session
            .handle_event(AuthEvent::SignedIn(ProviderUser {
                uid: "uid-o".into(),
                email: "old@shipwise.test".into(),
            }))
            .await;

        assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 1);
        assert_eq!(session.state().role, None);
    }

    #[tokio::test]
    async fn profile_failure_keeps_identity_without_role() {
        let provider = Arc::new(FakeProvider::new());
        let profile = Arc::new(FakeProfile::default().answer("token-uid-x", Err(500)));
        let session = AuthSession::new(provider.clone(), profile);

        session
            .handle_event(AuthEvent::SignedIn(ProviderUser {
                uid: "uid-x".into(),
                email: "x@shipwise.test".into(),
            }))
            .await;

        let state = session.state();
        assert_eq!(
            state.current_user.as_ref().map(|u| u.email.as_str()),
            Some("x@shipwise.test")
        );
        assert_eq!(state.role, None);
        assert!(!state.loading);
        assert!(!state.has_access(&[Role::ManagementStaff]));
        assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 0);
        assert_eq!(*session.watch_navigation().borrow(), None);
    }

    #[tokio::test]
    async fn logout_clears_state_and_returns_to_landing() {
        let provider = Arc::new(FakeProvider::new().with_account("boss@shipwise.test", "secret1", "uid-a"));
        let profile = Arc::new(FakeProfile::default().answer("token-uid-a", Ok(Role::Admin)));
        let session = AuthSession::new(provider.clone(), profile);
        let _listener = session.start();

        session.login("boss@shipwise.test", "secret1").await.unwrap();
        settled(&session).await;
        session.logout().await.unwrap();

        let state = session.state();
        assert_eq!(state.current_user, None);
        assert_eq!(state.role, None);
        assert_eq!(state.token, None);
        assert_eq!(*session.watch_navigation().borrow(), Some(Destination::Landing));
        assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 1);
    }

    struct GatedProfile {
        release: tokio::sync::Notify,
        role: Role,
    }

    #[async_trait]
    impl ProfileApi for GatedProfile {
        async fn current_user(&self, token: &str) -> Result<Profile, ProfileError> {
            self.release.notified().await;
            Ok(Profile {
                uid: token.trim_start_matches("token-").into(),
                email: "late@shipwise.test".into(),
                role: self.role,
            })
        }
    }

    #[tokio::test]
    async fn logout_wins_over_pending_sign_in() {
        let profile = Arc::new(GatedProfile {
            release: tokio::sync::Notify::new(),
            role: Role::Admin,
        });
        let session = AuthSession::new(Arc::new(FakeProvider::new()), profile.clone());

        let pending = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .handle_event(AuthEvent::SignedIn(ProviderUser {
                        uid: "uid-l".into(),
                        email: "late@shipwise.test".into(),
                    }))
                    .await;
            })
        };
        let mut rx = session.watch_state();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.current_user.is_some()))
            .await
            .expect("sign-in started")
            .expect("state channel open");

        session.logout().await.unwrap();
        profile.release.notify_one();
        pending.await.unwrap();

        let state = session.state();
        assert_eq!(state.current_user, None);
        assert_eq!(state.role, None);
        assert_eq!(state.token, None);
        assert_eq!(*session.watch_navigation().borrow(), Some(Destination::Landing));
    }

    #[tokio::test]
    async fn provider_sign_out_leaves_dashboard() {
        let profile = Arc::new(FakeProfile::default().answer("token-uid-s", Ok(Role::ManagementStaff)));
        let session = AuthSession::new(Arc::new(FakeProvider::new()), profile);

        session
            .handle_event(AuthEvent::SignedIn(ProviderUser {
                uid: "uid-s".into(),
                email: "ops@shipwise.test".into(),
            }))
            .await;
        assert_eq!(*session.watch_navigation().borrow(), Some(Destination::StaffDashboard));

        session.handle_event(AuthEvent::SignedOut).await;
        assert_eq!(session.state().current_user, None);
        assert_eq!(*session.watch_navigation().borrow(), Some(Destination::Landing));
    }
}
