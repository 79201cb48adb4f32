use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Create routes for the categories feature (require JWT authentication)
///
/// Listing is open to every user; create and delete need the admin role.
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/admin/categories", post(handlers::create_category))
        .route(
            "/api/admin/categories/{id}",
            delete(handlers::delete_category),
        )
        .with_state(service)
}
