use crate::errors::AppError;
use crate::models::payment::{Payment, PaymentPatch};
use crate::models::user::Identity;
use crate::store::repository::PaymentRepository;

/// Single-owner authorization for payment mutations.
///
/// The lookup and the mutation are separate store calls. The mutation itself
/// is conditional on `id AND owner_id`, so if the row is deleted in between
/// the late caller sees `NotFound` instead of touching anything.
#[derive(Clone)]
pub struct OwnershipGuard {
    payments: PaymentRepository,
}

impl OwnershipGuard {
    pub fn new(payments: PaymentRepository) -> Self {
        Self { payments }
    }

    /// Resolve the payment and confirm `actor` owns it. Never mutates.
    pub async fn authorize(&self, id: i64, actor: &Identity) -> Result<Payment, AppError> {
        let payment = self.payments.find_by_id(id).await?;
        match payment.owner_id {
            Some(owner) if owner == actor.user_id => Ok(payment),
            owner => {
                tracing::warn!(
                    payment_id = id,
                    actor = %actor.username,
                    owner = ?owner,
                    "ownership check failed"
                );
                Err(AppError::Forbidden)
            }
        }
    }

    pub async fn update(
        &self,
        id: i64,
        actor: &Identity,
        patch: &PaymentPatch,
    ) -> Result<Payment, AppError> {
        self.authorize(id, actor).await?;
        self.payments.update(id, actor.user_id, patch).await
    }

    pub async fn delete(&self, id: i64, actor: &Identity) -> Result<(), AppError> {
        self.authorize(id, actor).await?;
        self.payments.delete(id, actor.user_id).await
    }
}
