use std::sync::Arc;
use uuid::Uuid;

use super::model::AuthenticatedUser;
use super::services::TokenService;
use crate::core::error::{AppError, Result};
use crate::features::access::stores::UserStore;

/// Turns a bearer token into an [`AuthenticatedUser`].
///
/// The token only proves identity; the account is re-read on every request
/// so deactivation takes effect before the token expires.
pub struct JwtValidator {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
}

impl JwtValidator {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser> {
        let claims = self.tokens.verify(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Auth("Invalid subject in access token".to_string()))?;

        let principal = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        if !principal.is_active {
            return Err(AppError::Unauthorized("Account is disabled.".to_string()));
        }

        Ok(principal.into())
    }
}
