use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::features::admin::handlers;
use crate::features::admin::services::AdminService;

/// Create admin routes (all require the admin role), nested under `/api/admin`
pub fn routes(admin_service: Arc<AdminService>) -> Router {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/{id}/toggle-status", post(handlers::toggle_user_status))
        .route("/files", get(handlers::list_files))
        .route("/files/{id}", delete(handlers::delete_file))
        .route("/stats", get(handlers::system_stats))
        .route("/settings", get(handlers::list_settings))
        .route("/settings/{key}", put(handlers::update_setting))
        .route("/activities", get(handlers::list_user_activities))
        .with_state(admin_service)
}
