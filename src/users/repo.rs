use anyhow::Context;
use async_trait::async_trait;

use super::repo_types::{NewUser, User, UserRow};
use crate::{auth::roles::Role, db::PgDatabase};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;
    async fn insert_user(&self, new: NewUser) -> anyhow::Result<User>;
    /// Returns `false` when there was no local row for `id`.
    async fn delete_user(&self, id: &str) -> anyhow::Result<bool>;
    /// Returns `false` when there was no local row for `id`.
    async fn update_user_role(&self, id: &str, role: Role) -> anyhow::Result<bool>;
}

#[async_trait]
impl UserStore for PgDatabase {
    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("list users")?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn insert_user(&self, new: NewUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, role, created_at
            "#,
        )
        .bind(&new.id)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await
        .context("insert user")?;
        row.try_into()
    }

    async fn delete_user(&self, id: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_user_role(&self, id: &str, role: Role) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .context("update user role")?;
        Ok(res.rows_affected() > 0)
    }
}
