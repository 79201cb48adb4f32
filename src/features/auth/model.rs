use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::access::models::{Principal, UserRole};

/// The caller of a protected route, placed in request extensions by the
/// auth middleware after the token and the account have both been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<Principal> for AuthenticatedUser {
    fn from(principal: Principal) -> Self {
        Self {
            user_id: principal.id,
            email: principal.email,
            role: principal.role,
        }
    }
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}
