use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{Bid, BidRow, BidStatus, NewBid};
use crate::db::PgDatabase;

#[async_trait]
pub trait BidStore: Send + Sync {
    async fn list_bids(&self) -> anyhow::Result<Vec<Bid>>;
    async fn create_bid(&self, new: NewBid) -> anyhow::Result<Bid>;
    /// Returns `false` when no bid has this id.
    async fn delete_bid(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn update_bid_status(&self, id: Uuid, status: BidStatus) -> anyhow::Result<Option<Bid>>;
}

const BID_COLUMNS: &str = "id, material_type, quantity, pickup_location, delivery_location, \
     deadline, transporter_requirements, status, created_at";

#[async_trait]
impl BidStore for PgDatabase {
    async fn list_bids(&self) -> anyhow::Result<Vec<Bid>> {
        let rows = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("list bids")?;
        rows.into_iter().map(Bid::try_from).collect()
    }

    async fn create_bid(&self, new: NewBid) -> anyhow::Result<Bid> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            r#"
            INSERT INTO bids (material_type, quantity, pickup_location, delivery_location,
                              deadline, transporter_requirements, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(&new.material_type)
        .bind(new.quantity)
        .bind(&new.pickup_location)
        .bind(&new.delivery_location)
        .bind(new.deadline)
        .bind(&new.transporter_requirements)
        .bind(new.status.as_str())
        .fetch_one(&self.pool)
        .await
        .context("insert bid")?;
        row.try_into()
    }

    async fn delete_bid(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM bids WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete bid")?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_bid_status(&self, id: Uuid, status: BidStatus) -> anyhow::Result<Option<Bid>> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "UPDATE bids SET status = $2 WHERE id = $1 RETURNING {BID_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("update bid status")?;
        row.map(Bid::try_from).transpose()
    }
}
