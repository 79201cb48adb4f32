//! Role-based authorization guards.
//!
//! Guards read the [`AuthenticatedUser`] placed by the auth middleware and
//! reject callers without the required role.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for admin-only routes.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(admin): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(RequireAdmin(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::models::UserRole;
    use crate::shared::test_helpers::{with_user, TestUser};
    use axum::{http::StatusCode, routing::get, Router};
    use axum_test::TestServer;

    async fn admin_only(RequireAdmin(admin): RequireAdmin) -> String {
        admin.email
    }

    fn app(role: UserRole) -> TestServer {
        let router = Router::new().route("/admin", get(admin_only));
        TestServer::new(with_user(router, TestUser::with_role(role).authenticated())).unwrap()
    }

    #[tokio::test]
    async fn test_admin_passes() {
        let response = app(UserRole::Admin).get("/admin").await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_regular_user_is_forbidden() {
        let response = app(UserRole::User).get("/admin").await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthorized() {
        let server = TestServer::new(Router::new().route("/admin", get(admin_only))).unwrap();
        server
            .get("/admin")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
