pub mod access;
pub mod admin;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod files;
pub mod settings;
pub mod users;
