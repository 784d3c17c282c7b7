//! Provisions the first administrator so someone can sign in and create the
//! remaining accounts. Does nothing if the provider already knows the e-mail.

use anyhow::Context;
use shipwise::{
    auth::Role,
    config::AppConfig,
    db::PgDatabase,
    identity::{FirebaseIdentity, IdentityProvider},
    logging,
    users::services::create_account,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let email = std::env::var("INITIAL_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@yourcompany.com".into());
    let password =
        std::env::var("INITIAL_ADMIN_PASSWORD").unwrap_or_else(|_| "password".into());

    let config = AppConfig::from_env()?;
    let identity = FirebaseIdentity::new(config.firebase.clone(), config.identity_timeout())?;

    if let Some(existing) = identity
        .get_user_by_email(&email)
        .await
        .context("look up initial admin")?
    {
        tracing::info!(uid = %existing.subject_id, %email, "admin user already exists");
        return Ok(());
    }

    let db = PgDatabase::connect(&config.database_url).await?;
    db.migrate().await?;

    let user = create_account(&identity, &db, &email, &password, Role::Admin).await?;
    tracing::info!(uid = %user.id, email = %user.email, "initial admin created");
    tracing::warn!("change the initial admin password after first login");
    Ok(())
}
