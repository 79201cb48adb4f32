use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::access::models::PermissionLevel;
use crate::features::files::models::GrantWithUser;

/// Request DTO for granting a user access to a restricted file
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ShareFileDto {
    #[validate(email(message = "Invalid email format"))]
    pub user_email: String,

    /// Defaults to `view`
    #[serde(default)]
    pub permission: PermissionLevel,

    /// No expiry when omitted
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response DTO for a grant
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrantResponseDto {
    pub id: Uuid,
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub permission: PermissionLevel,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
}

impl GrantResponseDto {
    pub fn from_row(row: GrantWithUser, now: DateTime<Utc>) -> Self {
        let user_name = row.user_name();
        let g = row.grant;
        Self {
            id: g.id,
            file_id: g.file_id,
            user_id: g.user_id,
            user_email: row.user_email,
            user_name,
            permission: g.permission,
            granted_by: g.granted_by,
            granted_at: g.granted_at,
            is_expired: g.is_expired_at(now),
            expires_at: g.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::models::Grant;
    use chrono::Duration;

    #[test]
    fn test_share_permission_defaults_to_view() {
        let dto: ShareFileDto =
            serde_json::from_str(r#"{"user_email":"bob@example.com"}"#).unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.permission, PermissionLevel::View);
        assert!(dto.expires_at.is_none());

        let dto: ShareFileDto =
            serde_json::from_str(r#"{"user_email":"not-an-email","permission":"edit"}"#).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_grant_response_marks_expiry() {
        let now = Utc::now();
        let row = GrantWithUser {
            grant: Grant {
                id: Uuid::new_v4(),
                file_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                permission: PermissionLevel::Download,
                granted_by: Uuid::new_v4(),
                granted_at: now - Duration::days(2),
                expires_at: Some(now - Duration::hours(1)),
            },
            user_email: "bob@example.com".to_string(),
            user_username: "bob".to_string(),
            user_first_name: String::new(),
            user_last_name: String::new(),
        };

        let dto = GrantResponseDto::from_row(row, now);
        assert!(dto.is_expired);
        assert_eq!(dto.user_name, "bob");
    }
}
