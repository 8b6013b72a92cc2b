use std::sync::Arc;

use uuid::Uuid;

use super::PaymentStore;
use crate::errors::AppError;
use crate::models::payment::{Payment, PaymentPatch};
use crate::models::user::Identity;

/// Payment CRUD over a [`PaymentStore`].
///
/// Writes only accept a [`PaymentPatch`], so malformed input is rejected
/// before the store is touched. Store failures surface as
/// `AppError::StoreUnavailable` with no retry.
#[derive(Clone)]
pub struct PaymentRepository {
    store: Arc<dyn PaymentStore>,
}

impl PaymentRepository {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, owner: &Identity, patch: &PaymentPatch) -> Result<Payment, AppError> {
        let payment = self
            .store
            .insert_payment(owner.user_id, &owner.username, patch)
            .await?;
        tracing::info!(
            payment_id = payment.id,
            owner = %owner.username,
            amount = payment.amount,
            "payment created"
        );
        Ok(payment)
    }

    pub async fn find_all(&self, owner_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = self.store.list_payments(owner_id).await?;
        tracing::debug!(count = payments.len(), "listed payments");
        Ok(payments)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Payment, AppError> {
        self.store.get_payment(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn update(
        &self,
        id: i64,
        owner_id: Uuid,
        patch: &PaymentPatch,
    ) -> Result<Payment, AppError> {
        let updated = self
            .store
            .update_payment(id, owner_id, patch)
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::info!(payment_id = id, "payment updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64, owner_id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_payment(id, owner_id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(payment_id = id, "payment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;

    struct DownStore;

    #[async_trait]
    impl PaymentStore for DownStore {
        async fn insert_payment(&self, _: Uuid, _: &str, _: &PaymentPatch) -> anyhow::Result<Payment> {
            anyhow::bail!("connection refused")
        }
        async fn list_payments(&self, _: Uuid) -> anyhow::Result<Vec<Payment>> {
            anyhow::bail!("connection refused")
        }
        async fn get_payment(&self, _: i64) -> anyhow::Result<Option<Payment>> {
            anyhow::bail!("connection refused")
        }
        async fn update_payment(&self, _: i64, _: Uuid, _: &PaymentPatch) -> anyhow::Result<Option<Payment>> {
            anyhow::bail!("connection refused")
        }
        async fn delete_payment(&self, _: i64, _: Uuid) -> anyhow::Result<bool> {
            anyhow::bail!("connection refused")
        }
    }

    fn ana() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "ana".into(),
        }
    }

    #[tokio::test]
    async fn test_create_records_owner() {
        let repo = PaymentRepository::new(Arc::new(MemoryStore::new()));
        let owner = ana();
        let p = repo
            .create(&owner, &PaymentPatch::new("2026-04-01", 120.0).unwrap())
            .await
            .unwrap();
        assert_eq!(p.owner_id, Some(owner.user_id));
        assert_eq!(p.owner_username.as_deref(), Some("ana"));
        assert_eq!(repo.find_by_id(p.id).await.unwrap(), p);
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let repo = PaymentRepository::new(Arc::new(MemoryStore::new()));
        let patch = PaymentPatch::new("2026-04-01", 1.0).unwrap();
        assert!(matches!(repo.find_by_id(404).await, Err(AppError::NotFound)));
        assert!(matches!(
            repo.update(404, Uuid::new_v4(), &patch).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(repo.delete(404, Uuid::new_v4()).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_store_failures_become_store_unavailable() {
        let repo = PaymentRepository::new(Arc::new(DownStore));
        let patch = PaymentPatch::new("2026-04-01", 1.0).unwrap();
        assert!(matches!(
            repo.create(&ana(), &patch).await,
            Err(AppError::StoreUnavailable(_))
        ));
        assert!(matches!(
            repo.find_all(Uuid::new_v4()).await,
            Err(AppError::StoreUnavailable(_))
        ));
        assert!(matches!(repo.find_by_id(1).await, Err(AppError::StoreUnavailable(_))));
    }
}
