use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::access::handlers;
use crate::features::access::services::AccessService;

/// Create routes for the access feature (require JWT authentication)
pub fn routes(service: Arc<AccessService>) -> Router {
    Router::new()
        .route("/api/files/{id}/permissions", get(handlers::check_access))
        .with_state(service)
}
