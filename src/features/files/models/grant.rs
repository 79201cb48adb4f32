use sqlx::FromRow;

use crate::features::access::models::Grant;

/// Grant joined with the grantee's account details
#[derive(Debug, Clone, FromRow)]
pub struct GrantWithUser {
    #[sqlx(flatten)]
    pub grant: Grant,
    pub user_email: String,
    pub user_username: String,
    pub user_first_name: String,
    pub user_last_name: String,
}

impl GrantWithUser {
    pub fn user_name(&self) -> String {
        let full = format!("{} {}", self.user_first_name, self.user_last_name);
        let full = full.trim();
        if full.is_empty() {
            self.user_username.clone()
        } else {
            full.to_string()
        }
    }
}
