use anyhow::Context;
use tracing::{error, warn};

use super::repo_types::{NewUser, User};
use crate::{
    auth::{password::hash_password, roles::Role},
    db::Database,
    identity::IdentityProvider,
};

/// Creates an account in the identity provider, assigns its role claim and
/// stores the local row, in that order.
///
/// The two systems cannot share a transaction. If anything after the
/// provider account creation fails, the provider account is deleted again
/// before the error is returned. A failed rollback is logged with the
/// orphaned subject id.
pub async fn create_account(
    identity: &dyn IdentityProvider,
    db: &dyn Database,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<User> {
    let account = identity
        .create_user(email, password)
        .await
        .context("create provider account")?;

    match provision(identity, db, &account.subject_id, email, password, role).await {
        Ok(user) => Ok(user),
        Err(e) => {
            match identity.delete_user(&account.subject_id).await {
                Ok(()) => warn!(
                    uid = %account.subject_id,
                    "rolled back provider account after failed provisioning"
                ),
                Err(rollback) => error!(
                    uid = %account.subject_id,
                    error = %rollback,
                    "provider account orphaned: rollback after failed provisioning failed"
                ),
            }
            Err(e)
        }
    }
}

async fn provision(
    identity: &dyn IdentityProvider,
    db: &dyn Database,
    subject_id: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<User> {
    identity
        .set_role_claim(subject_id, role)
        .await
        .context("set role claim")?;

    let password_hash = hash_password(password)?;
    db.insert_user(NewUser {
        id: subject_id.to_string(),
        email: email.to_string(),
        password_hash,
        role,
    })
    .await
}
