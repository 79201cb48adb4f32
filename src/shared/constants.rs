/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// LISTING PAGE SIZES
// =============================================================================

/// Page size for the user-facing file grids (my files, shared, public)
pub const FILES_PAGE_SIZE: i64 = 12;

/// Page size for admin listings
pub const ADMIN_PAGE_SIZE: i64 = 20;

/// Number of recent files/activities on the dashboard
pub const DASHBOARD_RECENT_LIMIT: i64 = 10;

// =============================================================================
// SYSTEM SETTINGS
// =============================================================================

/// Setting that turns the public file browser on or off
pub const SETTING_PUBLIC_FILE_BROWSING: &str = "enable_public_file_browsing";

/// Name used in outgoing email
pub const APP_NAME: &str = "Secure File Manager";
