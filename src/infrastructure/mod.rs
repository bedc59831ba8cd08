//! Infrastructure layer - Storage, credentials and observability implementations

pub mod auth;
pub mod logging;
pub mod migrations;
pub mod observability;
pub mod user;
