//! Handler tests that stop before any query succeeds: the access rules come
//! from an in-memory store and the pool points at a closed port.

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use uuid::Uuid;

use crate::features::access::models::{PermissionLevel, Principal, UserRole, Visibility};
use crate::features::access::stores::MemoryStore;
use crate::features::access::AccessService;
use crate::features::files::routes;
use crate::features::files::services::{ActivityService, FileService, ShareService};
use crate::features::settings::SettingsService;
use crate::modules::storage::LocalStorage;
use crate::shared::clock::SystemClock;
use crate::shared::test_helpers::with_user;

const MAX_UPLOAD: usize = 64;

struct Harness {
    store: Arc<MemoryStore>,
    _dir: tempfile::TempDir,
    file_service: Arc<FileService>,
    share_service: Arc<ShareService>,
}

impl Harness {
    fn new() -> Self {
        // Nothing listens on port 1, so a query fails fast instead of hanging
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(250))
            .connect_lazy("postgres://postgres@127.0.0.1:1/secure_file_manager_test")
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(SystemClock);
        let dir = tempfile::tempdir().unwrap();

        let access = Arc::new(AccessService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            clock.clone(),
        ));
        let activity = Arc::new(ActivityService::new(pool.clone()));
        let share_service = Arc::new(ShareService::new(
            pool.clone(),
            access.clone(),
            activity.clone(),
            clock.clone(),
        ));
        let file_service = Arc::new(FileService::new(
            pool.clone(),
            Arc::new(LocalStorage::new(dir.path())),
            access,
            share_service.clone(),
            activity,
            Arc::new(SettingsService::new(pool)),
            clock,
            MAX_UPLOAD,
        ));

        Self {
            store,
            _dir: dir,
            file_service,
            share_service,
        }
    }

    fn server(&self, as_user: &Principal) -> TestServer {
        let router = routes(self.file_service.clone(), self.share_service.clone());
        TestServer::new(with_user(router, as_user.clone().into())).unwrap()
    }
}

fn upload_form(filename: &str, bytes: &[u8]) -> MultipartForm {
    MultipartForm::new()
        .add_text("description", "quarterly numbers")
        .add_part(
            "file",
            Part::bytes(bytes.to_vec())
                .file_name(filename)
                .mime_type("application/octet-stream"),
        )
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);

    let response = harness
        .server(&owner)
        .post("/api/files")
        .multipart(upload_form("installer.exe", b"MZ"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("File type '.exe' is not allowed"));
}

#[tokio::test]
async fn test_upload_requires_file_part() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);

    harness
        .server(&owner)
        .post("/api/files")
        .multipart(MultipartForm::new().add_text("name", "nothing attached"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_over_limit_is_413() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);

    harness
        .server(&owner)
        .post("/api/files")
        .multipart(upload_form("big.pdf", &[b'x'; MAX_UPLOAD + 1]))
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_upload_rejects_unknown_visibility() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);

    let form = upload_form("notes.txt", b"hello").add_text("visibility", "secret");
    harness
        .server(&owner)
        .post("/api/files")
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_private_file_is_forbidden_to_others() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let other = harness.store.add_user("other@example.com", UserRole::User);
    let file = harness.store.add_file(&owner, Visibility::Private);

    let server = harness.server(&other);

    let response = server.get(&format!("/api/files/{}", file.id)).await;
    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "You do not have permission to view this file."
    );

    server
        .get(&format!("/api/files/{}/download", file.id))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_open_private_file() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let admin = harness.store.add_user("admin@example.com", UserRole::Admin);
    let file = harness.store.add_file(&owner, Visibility::Private);

    harness
        .server(&admin)
        .get(&format!("/api/files/{}", file.id))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_view_grant_cannot_download() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let guest = harness.store.add_user("guest@example.com", UserRole::User);
    let file = harness.store.add_file(&owner, Visibility::Restricted);
    harness
        .store
        .grant(&file, &guest, PermissionLevel::View, None);

    let response = harness
        .server(&guest)
        .get(&format!("/api/files/{}/download", file.id))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "You do not have permission to download this file."
    );
}

#[tokio::test]
async fn test_expired_edit_grant_cannot_update() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let guest = harness.store.add_user("guest@example.com", UserRole::User);
    let file = harness.store.add_file(&owner, Visibility::Restricted);
    harness.store.grant(
        &file,
        &guest,
        PermissionLevel::Edit,
        Some(Utc::now() - Duration::minutes(1)),
    );

    harness
        .server(&guest)
        .patch(&format!("/api/files/{}", file.id))
        .json(&json!({ "name": "renamed" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_editor_cannot_change_visibility() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let editor = harness.store.add_user("editor@example.com", UserRole::User);
    let file = harness.store.add_file(&owner, Visibility::Restricted);
    harness
        .store
        .grant(&file, &editor, PermissionLevel::Edit, None);

    let response = harness
        .server(&editor)
        .patch(&format!("/api/files/{}", file.id))
        .json(&json!({ "visibility": "public" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "Only the file owner can change visibility or category."
    );
}

#[tokio::test]
async fn test_update_rejects_overlong_name() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let file = harness.store.add_file(&owner, Visibility::Private);

    harness
        .server(&owner)
        .patch(&format!("/api/files/{}", file.id))
        .json(&json!({ "name": "x".repeat(256) }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_file_is_404() {
    let harness = Harness::new();
    let user = harness.store.add_user("someone@example.com", UserRole::User);

    harness
        .server(&user)
        .get(&format!("/api/files/{}", Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_view_reads_grant_once() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let guest = harness.store.add_user("guest@example.com", UserRole::User);
    let file = harness.store.add_file(&owner, Visibility::Restricted);
    harness
        .store
        .grant(&file, &guest, PermissionLevel::View, None);

    // Authorized, then stops at the metadata query
    let response = harness
        .server(&guest)
        .get(&format!("/api/files/{}", file.id))
        .await;

    assert!(response.status_code().is_server_error());
    assert_eq!(harness.store.grant_lookups(), 1);
}

fn share_body(email: &str, expires_at: Option<chrono::DateTime<Utc>>) -> Value {
    json!({
        "user_email": email,
        "permission": "download",
        "expires_at": expires_at.map(|t| t.to_rfc3339()),
    })
}

#[tokio::test]
async fn test_share_rejects_past_expiry() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let file = harness.store.add_file(&owner, Visibility::Restricted);

    let response = harness
        .server(&owner)
        .post(&format!("/api/files/{}/shares", file.id))
        .json(&share_body(
            "guest@example.com",
            Some(Utc::now() - Duration::hours(1)),
        ))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "Expiry must be in the future.");
}

#[tokio::test]
async fn test_share_with_self_is_rejected() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let file = harness.store.add_file(&owner, Visibility::Restricted);

    let response = harness
        .server(&owner)
        .post(&format!("/api/files/{}/shares", file.id))
        .json(&share_body("Owner@Example.com", None))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["message"], "You cannot share a file with yourself.");
}

#[tokio::test]
async fn test_share_requires_restricted_file() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let file = harness.store.add_file(&owner, Visibility::Public);

    let response = harness
        .server(&owner)
        .post(&format!("/api/files/{}/shares", file.id))
        .json(&share_body("guest@example.com", None))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "Only restricted files can be shared with specific users."
    );
}

#[tokio::test]
async fn test_only_owner_can_share() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);
    let editor = harness.store.add_user("editor@example.com", UserRole::User);
    let file = harness.store.add_file(&owner, Visibility::Restricted);
    harness
        .store
        .grant(&file, &editor, PermissionLevel::Edit, None);

    harness
        .server(&editor)
        .post(&format!("/api/files/{}/shares", file.id))
        .json(&share_body("guest@example.com", None))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    harness
        .server(&editor)
        .get(&format!("/api/files/{}/shares", file.id))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_share_unknown_file_is_404() {
    let harness = Harness::new();
    let owner = harness.store.add_user("owner@example.com", UserRole::User);

    harness
        .server(&owner)
        .post(&format!("/api/files/{}/shares", Uuid::new_v4()))
        .json(&share_body("guest@example.com", None))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
