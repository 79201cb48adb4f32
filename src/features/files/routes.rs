use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers;
use crate::features::files::services::{FileService, ShareService};

/// Room for multipart boundaries and the text fields around the file
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create routes for the files feature (require JWT authentication)
pub fn routes(file_service: Arc<FileService>, share_service: Arc<ShareService>) -> Router {
    let body_limit = file_service.max_upload_size() + MULTIPART_OVERHEAD;

    let files = Router::new()
        .route(
            "/api/files",
            get(handlers::list_my_files)
                .post(handlers::upload_file)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/files/shared", get(handlers::shared_with_me))
        .route("/api/files/public", get(handlers::public_files))
        .route(
            "/api/files/{id}",
            get(handlers::get_file)
                .patch(handlers::update_file)
                .delete(handlers::delete_file),
        )
        .route("/api/files/{id}/download", get(handlers::download_file))
        .route("/api/files/{id}/favorite", post(handlers::toggle_favorite))
        .with_state(file_service);

    let shares = Router::new()
        .route(
            "/api/files/{id}/shares",
            get(handlers::list_grants).post(handlers::share_file),
        )
        .route("/api/shares/{id}", delete(handlers::remove_access))
        .with_state(share_service);

    files.merge(shares)
}
