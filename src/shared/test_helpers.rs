#[cfg(test)]
pub use helpers::*;

#[cfg(test)]
mod helpers {
    use axum::{extract::Request, middleware::Next, Router};
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;
    use uuid::Uuid;

    use crate::features::access::models::UserRole;
    use crate::features::auth::model::AuthenticatedUser;

    /// A generated account for handler tests
    #[derive(Debug, Clone)]
    pub struct TestUser {
        pub id: Uuid,
        pub email: String,
        pub role: UserRole,
    }

    impl TestUser {
        pub fn with_role(role: UserRole) -> Self {
            Self {
                id: Uuid::new_v4(),
                email: SafeEmail().fake(),
                role,
            }
        }

        pub fn authenticated(&self) -> AuthenticatedUser {
            AuthenticatedUser {
                user_id: self.id,
                email: self.email.clone(),
                role: self.role,
            }
        }
    }

    /// Wrap `router` so every request runs as `user`, skipping token checks
    pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
        router.layer(axum::middleware::from_fn(
            move |mut request: Request, next: Next| {
                let user = user.clone();
                async move {
                    request.extensions_mut().insert(user);
                    next.run(request).await
                }
            },
        ))
    }
}
