//! File access decisions.
//!
//! [`decider`] holds the rule set; [`services::AccessService`] is what the
//! rest of the application calls.

pub mod decider;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod stores;

pub use routes::routes;
pub use services::AccessService;
