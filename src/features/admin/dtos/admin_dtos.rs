use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::access::models::{UserRole, Visibility};
use crate::features::admin::models::UserActivity;
use crate::features::auth::models::User;
use crate::features::files::dtos::FileActivityDto;
use crate::shared::format::format_file_size;

// =============================================================================
// USER DTOs
// =============================================================================

/// Account state filter; `active` means active and verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// Query params for listing users
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AdminUserQuery {
    /// Search in first/last name, email and username
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl AdminUserQuery {
    /// `Some(true)` for active, `Some(false)` for inactive
    pub fn wants_active(&self) -> Option<bool> {
        self.status.map(|s| s == UserStatus::Active)
    }
}

/// User row with per-user file totals
#[derive(Debug, Clone, FromRow)]
pub struct AdminUserRow {
    #[sqlx(flatten)]
    pub user: User,
    pub file_count: i64,
    pub total_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminUserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone_number: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_active: bool,
    pub file_count: i64,
    pub total_size: i64,
    pub total_size_display: String,
    pub created_at: DateTime<Utc>,
}

impl From<AdminUserRow> for AdminUserDto {
    fn from(row: AdminUserRow) -> Self {
        let u = row.user;
        Self {
            full_name: u.full_name(),
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            phone_number: u.phone_number,
            role: u.role,
            is_verified: u.is_verified,
            is_active: u.is_active,
            file_count: row.file_count,
            total_size_display: format_file_size(row.total_size),
            total_size: row.total_size,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserStatusDto {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
}

// =============================================================================
// FILE DTOs
// =============================================================================

/// Query params for listing all files
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AdminFileQuery {
    /// Search in file name and description
    pub search: Option<String>,
    /// Owner email, matched case-insensitively
    pub owner: Option<String>,
    pub category: Option<Uuid>,
    pub visibility: Option<Visibility>,
}

// =============================================================================
// SYSTEM STATS DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct FileTypeCountDto {
    pub file_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct TopUserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub file_count: i64,
    pub total_size: i64,
    #[sqlx(skip)]
    pub total_size_display: String,
}

/// Counters computed in one pass over files and users
#[derive(Debug, Clone, Default, FromRow)]
pub struct SystemCounters {
    pub total_files: i64,
    pub files_this_week: i64,
    pub files_this_month: i64,
    pub total_storage: i64,
    pub total_downloads: i64,
    pub total_users: i64,
    pub active_users: i64,
    pub new_users_this_week: i64,
    pub activities_this_week: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SystemStatsDto {
    pub total_files: i64,
    pub files_this_week: i64,
    pub files_this_month: i64,
    pub total_storage: i64,
    pub total_storage_display: String,
    pub total_users: i64,
    pub active_users: i64,
    pub new_users_this_week: i64,
    pub total_downloads: i64,
    pub activities_this_week: i64,
    pub file_types: Vec<FileTypeCountDto>,
    pub top_users: Vec<TopUserDto>,
    pub recent_activities: Vec<FileActivityDto>,
}

// =============================================================================
// AUDIT DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserActivityDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserActivity> for UserActivityDto {
    fn from(a: UserActivity) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            action: a.action,
            description: a.description,
            ip_address: a.ip_address,
            created_at: a.created_at,
        }
    }
}
