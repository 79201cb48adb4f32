//! Modules layer - Infrastructure components for external integrations
//!
//! Contains adapters for object storage and outgoing email.

pub mod mailer;
pub mod storage;
