//! Administration endpoints, nested under `/api/admin`.
//!
//! Every handler takes the [`RequireAdmin`](crate::features::auth::guards::RequireAdmin) guard.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::AdminService;
