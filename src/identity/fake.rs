use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use super::{IdentityError, IdentityProvider, IdentityUser, RoleClaim, VerifiedToken};
use crate::auth::roles::Role;

/// In-memory provider for tests. Tokens map straight to subject ids.
#[derive(Default)]
pub struct FakeIdentity {
    inner: Mutex<Inner>,
    calls: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    tokens: HashMap<String, String>,
    users: HashMap<String, IdentityUser>,
    next_id: u32,
    fail_claims: bool,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, token: &str, subject_id: &str, email: &str, role: Option<Role>) -> Self {
        self.with_claim(token, subject_id, email, role.into())
    }

    pub fn with_claim(self, token: &str, subject_id: &str, email: &str, claim: RoleClaim) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.tokens.insert(token.into(), subject_id.into());
            inner.users.insert(
                subject_id.into(),
                IdentityUser {
                    subject_id: subject_id.into(),
                    email: email.into(),
                    role_claim: claim,
                },
            );
        }
        self
    }

    /// Makes every `set_role_claim` call fail.
    pub fn failing_claims(self) -> Self {
        self.inner.lock().unwrap().fail_claims = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn user(&self, subject_id: &str) -> Option<IdentityUser> {
        self.inner.lock().unwrap().users.get(subject_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.inner.lock().unwrap().users.len()
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, IdentityError> {
        self.hit();
        let inner = self.inner.lock().unwrap();
        inner
            .tokens
            .get(token)
            .map(|id| VerifiedToken { subject_id: id.clone() })
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".into()))
    }

    async fn get_user(&self, subject_id: &str) -> Result<IdentityUser, IdentityError> {
        self.hit();
        self.user(subject_id)
            .ok_or_else(|| IdentityError::UserNotFound(subject_id.into()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<IdentityUser>, IdentityError> {
        self.hit();
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<IdentityUser, IdentityError> {
        self.hit();
        let mut inner = self.inner.lock().unwrap();
        if inner.users.values().any(|u| u.email == email) {
            return Err(IdentityError::CreateFailed("EMAIL_EXISTS".into()));
        }
        inner.next_id += 1;
        let user = IdentityUser {
            subject_id: format!("fake-uid-{}", inner.next_id),
            email: email.into(),
            role_claim: RoleClaim::Absent,
        };
        inner.users.insert(user.subject_id.clone(), user.clone());
        Ok(user)
    }

    async fn set_role_claim(&self, subject_id: &str, role: Role) -> Result<(), IdentityError> {
        self.hit();
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_claims {
            return Err(IdentityError::ClaimUpdateFailed("claims disabled".into()));
        }
        let user = inner
            .users
            .get_mut(subject_id)
            .ok_or_else(|| IdentityError::ClaimUpdateFailed("USER_NOT_FOUND".into()))?;
        user.role_claim = RoleClaim::Known(role);
        Ok(())
    }

    async fn delete_user(&self, subject_id: &str) -> Result<(), IdentityError> {
        self.hit();
        let mut inner = self.inner.lock().unwrap();
        inner
            .users
            .remove(subject_id)
            .map(|_| ())
            .ok_or_else(|| IdentityError::DeleteFailed("USER_NOT_FOUND".into()))
    }

    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityError> {
        self.hit();
        Ok(format!("https://fake.local/reset?email={email}"))
    }
}
