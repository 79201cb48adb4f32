//! Runtime switches stored in `system_settings`, edited through the admin API.

pub mod dtos;
pub mod models;
pub mod services;

pub use services::SettingsService;
