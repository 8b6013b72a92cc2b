use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{PaymentStore, UserStore};
use crate::models::payment::{Payment, PaymentPatch};
use crate::models::user::UserRow;

const PAYMENT_COLUMNS: &str = "id, date, amount, owner_id, owner_username, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("failed to connect to database")?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<UserRow>> {
        // ON CONFLICT keeps the uniqueness decision inside a single statement.
        let row = sqlx::query_as::<_, UserRow>(
            r#"INSERT INTO users (username, password_hash)
               VALUES ($1, $2)
               ON CONFLICT (username) DO NOTHING
               RETURNING id, username, password_hash, created_at"#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .context("failed to insert user")?;
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("failed to look up user")?;
        Ok(row)
    }
}

#[async_trait]
impl PaymentStore for PgStore {
    async fn insert_payment(
        &self,
        owner_id: Uuid,
        owner_username: &str,
        patch: &PaymentPatch,
    ) -> anyhow::Result<Payment> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            r#"INSERT INTO payments (date, amount, owner_id, owner_username)
               VALUES ($1, $2, $3, $4)
               RETURNING {PAYMENT_COLUMNS}"#
        ))
        .bind(patch.date())
        .bind(patch.amount())
        .bind(owner_id)
        .bind(owner_username)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert payment")?;
        Ok(row)
    }

    async fn list_payments(&self, owner_id: Uuid) -> anyhow::Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE owner_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list payments")?;
        Ok(rows)
    }

    async fn get_payment(&self, id: i64) -> anyhow::Result<Option<Payment>> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch payment")?;
        Ok(row)
    }

    async fn update_payment(
        &self,
        id: i64,
        owner_id: Uuid,
        patch: &PaymentPatch,
    ) -> anyhow::Result<Option<Payment>> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            r#"UPDATE payments SET date = $3, amount = $4
               WHERE id = $1 AND owner_id = $2
               RETURNING {PAYMENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(patch.date())
        .bind(patch.amount())
        .fetch_optional(&self.pool)
        .await
        .context("failed to update payment")?;
        Ok(row)
    }

    async fn delete_payment(&self, id: i64, owner_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .context("failed to delete payment")?;
        Ok(result.rows_affected() > 0)
    }
}
