use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Audit entry for an administrative action
#[derive(Debug, Clone, FromRow)]
pub struct UserActivity {
    pub id: Uuid,
    /// The acting admin
    pub user_id: Uuid,
    pub action: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
