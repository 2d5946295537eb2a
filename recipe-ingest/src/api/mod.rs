//! HTTP API
//!
//! - **webhook** - event payload decoding and validation
//! - **import** - `/webhook` and `/extract` handlers
//! - **health** - `/health`

pub mod health;
pub mod import;
pub mod webhook;

pub use health::health_routes;
pub use import::import_routes;
