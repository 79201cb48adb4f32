use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::access::dtos::FilePermissionsDto;
use crate::features::access::services::AccessService;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::types::ApiResponse;

/// Report which operations the caller may perform on a file
#[utoipa::path(
    get,
    path = "/api/files/{id}/permissions",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Allowed operations", body = ApiResponse<FilePermissionsDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    tag = "files",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn check_access(
    user: AuthenticatedUser,
    State(service): State<Arc<AccessService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FilePermissionsDto>>> {
    let permissions = service.permissions(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(Some(permissions), None, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::models::{PermissionLevel, UserRole, Visibility};
    use crate::features::access::routes::routes;
    use crate::features::access::stores::MemoryStore;
    use crate::shared::clock::SystemClock;
    use crate::shared::test_helpers::with_user;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use serde_json::Value;

    fn server(store: &Arc<MemoryStore>, as_user: AuthenticatedUser) -> TestServer {
        let service = Arc::new(AccessService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(SystemClock),
        ));
        TestServer::new(with_user(routes(service), as_user)).unwrap()
    }

    #[tokio::test]
    async fn test_reports_grant_level() {
        let store = Arc::new(MemoryStore::new());
        let owner = store.add_user("owner@example.com", UserRole::User);
        let guest = store.add_user("guest@example.com", UserRole::User);
        let file = store.add_file(&owner, Visibility::Restricted);
        store.grant(
            &file,
            &guest,
            PermissionLevel::Download,
            Some(Utc::now() + Duration::days(1)),
        );

        let response = server(&store, guest.clone().into())
            .get(&format!("/api/files/{}/permissions", file.id))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["can_view"], true);
        assert_eq!(body["data"]["can_download"], true);
        assert_eq!(body["data"]["can_edit"], false);
        assert_eq!(body["data"]["operations"], serde_json::json!(["view", "download"]));
    }

    #[tokio::test]
    async fn test_unknown_file_is_404() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("someone@example.com", UserRole::User);

        server(&store, user.into())
            .get(&format!("/api/files/{}/permissions", Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
