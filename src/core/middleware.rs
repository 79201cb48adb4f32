use crate::core::error::AppError;
use crate::features::auth::JwtValidator;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::prelude::*;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        // Parse origins into HeaderValue
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok());

            if let Some(auth_header) = auth_header {
                if let Some(encoded) = auth_header.strip_prefix("Basic ") {
                    if let Ok(decoded) = BASE64_STANDARD.decode(encoded) {
                        if let Ok(creds) = String::from_utf8(decoded) {
                            if bool::from(creds.as_bytes().ct_eq(credentials.as_bytes())) {
                                return Ok(next.run(req).await);
                            }
                        }
                    }
                }
            }

            let mut response = Response::new(Body::from("Unauthorized"));
            *response.status_mut() = StatusCode::UNAUTHORIZED;
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"Swagger UI\""),
            );

            Err(response)
        })
    }
}

pub async fn auth_middleware(
    State(validator): State<Arc<JwtValidator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })?;

    let user = validator.validate_token(token).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use crate::features::access::models::UserRole;
    use crate::features::access::stores::MemoryStore;
    use crate::features::auth::model::AuthenticatedUser;
    use crate::features::auth::services::TokenService;
    use axum::{middleware::from_fn_with_state, routing::get, Router};
    use axum_test::TestServer;
    use std::time::Duration;

    async fn whoami(user: AuthenticatedUser) -> String {
        user.email
    }

    struct Harness {
        server: TestServer,
        store: Arc<MemoryStore>,
        tokens: Arc<TokenService>,
    }

    fn harness() -> Harness {
        let tokens = Arc::new(TokenService::new(&AuthConfig {
            jwt_secret: "middleware-test-secret-of-32-bytes-plus".to_string(),
            jwt_issuer: "secure-file-manager".to_string(),
            jwt_expiry: Duration::from_secs(600),
            jwt_leeway: Duration::from_secs(0),
            otp_expiry: Duration::from_secs(600),
        }));
        let store = Arc::new(MemoryStore::new());
        let validator = Arc::new(JwtValidator::new(tokens.clone(), store.clone()));

        let app = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(validator, auth_middleware));

        Harness {
            server: TestServer::new(app).unwrap(),
            store,
            tokens,
        }
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let h = harness();
        let user = h.store.add_user("ada@example.com", UserRole::User);
        let token = h.tokens.issue(user.id, &user.email, user.role).unwrap();

        let response = h
            .server
            .get("/whoami")
            .authorization_bearer(&token.access_token)
            .await;

        response.assert_status_ok();
        response.assert_text("ada@example.com");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_rejected() {
        let h = harness();

        h.server
            .get("/whoami")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        h.server
            .get("/whoami")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Token abc"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        h.server
            .get("/whoami")
            .authorization_bearer("garbage")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_deactivated_or_deleted_account_is_rejected() {
        let h = harness();
        let mut user = h.store.add_user("ada@example.com", UserRole::User);
        let token = h.tokens.issue(user.id, &user.email, user.role).unwrap();

        user.is_active = false;
        h.store.put_user(user);
        h.server
            .get("/whoami")
            .authorization_bearer(&token.access_token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let ghost = h
            .tokens
            .issue(uuid::Uuid::new_v4(), "ghost@example.com", UserRole::User)
            .unwrap();
        h.server
            .get("/whoami")
            .authorization_bearer(&ghost.access_token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_swagger_basic_auth() {
        let app = Router::new()
            .route("/docs", get(|| async { "docs" }))
            .layer(axum::middleware::from_fn(basic_auth_middleware(Arc::new(
                "admin:secret".to_string(),
            ))));
        let server = TestServer::new(app).unwrap();

        server.get("/docs").await.assert_status(StatusCode::UNAUTHORIZED);

        let encoded = BASE64_STANDARD.encode("admin:secret");
        server
            .get("/docs")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Basic {}", encoded)).unwrap(),
            )
            .await
            .assert_status_ok();
    }
}
