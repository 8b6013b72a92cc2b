use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Stored account row. Never serialized to clients because it carries the hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller, as carried in token claims and request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl From<&UserRow> for Identity {
    fn from(row: &UserRow) -> Self {
        Identity {
            user_id: row.id,
            username: row.username.clone(),
        }
    }
}
