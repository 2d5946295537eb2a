//! recipe-ingest library interface
//!
//! Extraction cascade, destination client, renderer and HTTP surface; the
//! binary in `main.rs` wires them from configuration.

pub mod api;
pub mod error;
pub mod extractors;
pub mod fusion;
pub mod render;
pub mod services;
pub mod types;
pub mod validators;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use workflow::RecipeImporter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub importer: Arc<RecipeImporter>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(importer: Arc<RecipeImporter>) -> Self {
        Self {
            importer,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn record_error(&self, message: &str) {
        *self.last_error.write().await = Some(message.to_string());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::import_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
