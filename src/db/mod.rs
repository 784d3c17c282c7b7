use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{bids::repo::BidStore, transporters::repo::TransporterStore, users::repo::UserStore};

#[cfg(test)]
pub mod memory;

/// Everything the handlers need from persistence.
pub trait Database: UserStore + TransporterStore + BidStore + Send + Sync {}

impl<T> Database for T where T: UserStore + TransporterStore + BidStore + Send + Sync {}

/// Postgres-backed [`Database`]. Each resource module implements its store
/// trait for this type next to its queries.
#[derive(Clone)]
pub struct PgDatabase {
    pub pool: PgPool,
}

impl PgDatabase {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}
