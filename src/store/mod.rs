pub mod memory;
pub mod postgres;
pub mod repository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::payment::{Payment, PaymentPatch};
use crate::models::user::UserRow;

/// Persistence for accounts.
/// Implementations: PgStore (PostgreSQL), MemoryStore (in-process).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Returns `None` when the username is already taken;
    /// uniqueness is decided by the store at write time.
    async fn create_user(&self, username: &str, password_hash: &str)
        -> anyhow::Result<Option<UserRow>>;

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<UserRow>>;
}

/// Persistence for payment records.
///
/// Mutations are conditional on both id and owner, so a caller that checked
/// ownership first cannot touch a row that changed hands or vanished since.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert_payment(
        &self,
        owner_id: Uuid,
        owner_username: &str,
        patch: &PaymentPatch,
    ) -> anyhow::Result<Payment>;

    /// All payments owned by `owner_id`, newest first.
    async fn list_payments(&self, owner_id: Uuid) -> anyhow::Result<Vec<Payment>>;

    async fn get_payment(&self, id: i64) -> anyhow::Result<Option<Payment>>;

    /// Apply `patch` to the row matching both `id` and `owner_id`.
    async fn update_payment(
        &self,
        id: i64,
        owner_id: Uuid,
        patch: &PaymentPatch,
    ) -> anyhow::Result<Option<Payment>>;

    /// Delete the row matching both `id` and `owner_id`. Returns whether a row went away.
    async fn delete_payment(&self, id: i64, owner_id: Uuid) -> anyhow::Result<bool>;
}
