use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PaymentStore, UserStore};
use crate::models::payment::{Payment, PaymentPatch};
use crate::models::user::UserRow;

/// In-process store for local development (`serve --in-memory`) and tests.
/// Contents vanish with the process.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, UserRow>>,
    payments: Arc<RwLock<BTreeMap<i64, Payment>>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row as-is, bypassing validation and ownership. Used to stage
    /// rows that predate owner tracking.
    pub async fn insert_raw(&self, mut payment: Payment) -> Payment {
        payment.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.payments
            .write()
            .await
            .insert(payment.id, payment.clone());
        payment
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<UserRow>> {
        match self.users.entry(username.to_string()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                let row = UserRow {
                    id: Uuid::new_v4(),
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                    created_at: Utc::now(),
                };
                slot.insert(row.clone());
                Ok(Some(row))
            }
        }
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<UserRow>> {
        Ok(self.users.get(username).map(|r| r.value().clone()))
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn insert_payment(
        &self,
        owner_id: Uuid,
        owner_username: &str,
        patch: &PaymentPatch,
    ) -> anyhow::Result<Payment> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let payment = Payment {
            id,
            date: patch.date().to_string(),
            amount: patch.amount(),
            owner_id: Some(owner_id),
            owner_username: Some(owner_username.to_string()),
            created_at: Utc::now(),
        };
        self.payments.write().await.insert(id, payment.clone());
        Ok(payment)
    }

    async fn list_payments(&self, owner_id: Uuid) -> anyhow::Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut rows: Vec<Payment> = payments
            .values()
            .filter(|p| p.owner_id == Some(owner_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn get_payment(&self, id: i64) -> anyhow::Result<Option<Payment>> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn update_payment(
        &self,
        id: i64,
        owner_id: Uuid,
        patch: &PaymentPatch,
    ) -> anyhow::Result<Option<Payment>> {
        let mut payments = self.payments.write().await;
        match payments.get_mut(&id) {
            Some(p) if p.owner_id == Some(owner_id) => {
                p.date = patch.date().to_string();
                p.amount = patch.amount();
                Ok(Some(p.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_payment(&self, id: i64, owner_id: Uuid) -> anyhow::Result<bool> {
        let mut payments = self.payments.write().await;
        if payments.get(&id).map(|p| p.owner_id) == Some(Some(owner_id)) {
            payments.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
