use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::PermissionLevel;

/// Per-user permission on a restricted file. Unique per `(file_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Grant {
    pub id: Uuid,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub permission: PermissionLevel,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Grant {
    /// A grant stops counting at the instant of its expiry: only an expiry
    /// strictly after `now` keeps it live.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }
}
