use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{NewTransporter, Transporter, TransporterRow};
use crate::db::PgDatabase;

#[async_trait]
pub trait TransporterStore: Send + Sync {
    async fn list_transporters(&self) -> anyhow::Result<Vec<Transporter>>;
    async fn create_transporter(&self, new: NewTransporter) -> anyhow::Result<Transporter>;
    /// Returns `false` when no transporter has this id.
    async fn delete_transporter(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
impl TransporterStore for PgDatabase {
    async fn list_transporters(&self) -> anyhow::Result<Vec<Transporter>> {
        let rows = sqlx::query_as::<_, TransporterRow>(
            r#"
            SELECT id, name, contact, vehicle_type, capacity, status, created_at
            FROM transporters
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("list transporters")?;
        rows.into_iter().map(Transporter::try_from).collect()
    }

    async fn create_transporter(&self, new: NewTransporter) -> anyhow::Result<Transporter> {
        let row = sqlx::query_as::<_, TransporterRow>(
            r#"
            INSERT INTO transporters (name, contact, vehicle_type, capacity, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, contact, vehicle_type, capacity, status, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.contact)
        .bind(new.vehicle_type.as_str())
        .bind(new.capacity)
        .bind(new.status.as_str())
        .fetch_one(&self.pool)
        .await
        .context("insert transporter")?;
        row.try_into()
    }

    async fn delete_transporter(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM transporters WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete transporter")?;
        Ok(res.rows_affected() > 0)
    }
}
