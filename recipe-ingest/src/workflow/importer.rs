//! Import workflow
//!
//! validate event → resolve page → orchestrate → render → replace page content
//!
//! The destination page is always written once the event is valid: with the
//! recipe, with partial data and a warning, or with a visible failure record.

use crate::api::webhook::{parse_event, WebhookError, WebhookEvent};
use crate::render::{render, RenderedPage};
use crate::services::notion_client::{DestinationStore, StoreError};
use crate::types::ExtractionResult;
use crate::workflow::orchestrator::ExtractionOrchestrator;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const SUCCESS_MESSAGE: &str = "Successfully processed recipe";
pub const FAILURE_MESSAGE: &str = "Recorded extraction failure";

/// Status code plus JSON body returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportResponse {
    pub status: u16,
    pub body: Value,
}

impl ImportResponse {
    fn bad_request(err: &WebhookError) -> Self {
        Self {
            status: 400,
            body: json!({ "error": err.to_string() }),
        }
    }

    /// Error message carried in the body, if any
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// Webhook-driven import into the destination store
pub struct RecipeImporter {
    orchestrator: Arc<ExtractionOrchestrator>,
    store: Arc<dyn DestinationStore>,
    /// Database used to resolve `Unique ID` properties
    database_id: Option<String>,
}

impl RecipeImporter {
    pub fn new(
        orchestrator: Arc<ExtractionOrchestrator>,
        store: Arc<dyn DestinationStore>,
        database_id: Option<String>,
    ) -> Self {
        Self {
            orchestrator,
            store,
            database_id,
        }
    }

    pub fn orchestrator(&self) -> &ExtractionOrchestrator {
        &self.orchestrator
    }

    /// Handle one webhook event end to end
    pub async fn handle_event(&self, payload: &Value) -> ImportResponse {
        let event = match parse_event(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Rejected webhook event");
                return ImportResponse::bad_request(&e);
            }
        };

        let page_id = match self.resolve_page_id(&event).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Could not resolve destination page");
                return ImportResponse::bad_request(&e);
            }
        };

        info!(page_id = %page_id, url = %event.url, "Importing recipe");
        let result = self.orchestrator.extract(&event.url).await;

        let rendered = render(&result);
        let write_error = match self.write_page(&page_id, &rendered).await {
            Ok(()) => None,
            Err(e) => {
                error!(page_id = %page_id, error = %e, "Failed to update destination page");
                Some(format!("Failed to update page: {}", e))
            }
        };

        respond(&page_id, &result, write_error)
    }

    /// Page id from the `Unique ID` lookup, falling back to the payload's id
    async fn resolve_page_id(&self, event: &WebhookEvent) -> Result<String, WebhookError> {
        if let (Some(unique_id), Some(database_id)) = (&event.unique_id, &self.database_id) {
            match self
                .store
                .find_page_by_unique_id(database_id, unique_id.number)
                .await
            {
                Ok(Some(id)) => {
                    info!(unique_id = %unique_id, page_id = %id, "Resolved page from unique id");
                    return Ok(id);
                }
                Ok(None) => warn!(unique_id = %unique_id, "No page found with unique id"),
                Err(e) => warn!(unique_id = %unique_id, error = %e, "Unique id lookup failed"),
            }
        }

        event.page_id.clone().ok_or(WebhookError::MissingPageId)
    }

    /// Update properties and cover, then replace the page's blocks
    async fn write_page(&self, page_id: &str, page: &RenderedPage) -> Result<(), StoreError> {
        self.store.update_page(page_id, &page.properties, None).await?;

        if let Some(cover) = &page.cover {
            // A rejected cover URL must not block the content update
            if let Err(e) = self.store.update_page(page_id, &json!({}), Some(cover)).await {
                warn!(page_id, error = %e, "Failed to set cover image");
            }
        }

        match self.store.list_children(page_id).await {
            Ok(children) => {
                let mut deleted = 0usize;
                for block_id in &children {
                    match self.store.delete_block(block_id).await {
                        Ok(()) => deleted += 1,
                        Err(e) => warn!(block_id = %block_id, error = %e, "Failed to delete block"),
                    }
                }
                info!(page_id, deleted, "Removed existing blocks");
            }
            Err(e) => warn!(page_id, error = %e, "Could not list existing blocks"),
        }

        self.store.append_children(page_id, &page.blocks).await?;
        info!(page_id, blocks = page.blocks.len(), "Appended content blocks");
        Ok(())
    }
}

fn respond(page_id: &str, result: &ExtractionResult, write_error: Option<String>) -> ImportResponse {
    let message = if result.is_failure() {
        FAILURE_MESSAGE
    } else {
        SUCCESS_MESSAGE
    };

    let mut body = json!({
        "message": message,
        "page_id": page_id,
        "url": result.url,
        "confidence_score": result.confidence_score,
    });
    if let Some(warning) = &result.warning {
        body["warning"] = json!(warning);
    }
    if let Some(error) = write_error.as_ref().or(result.error.as_ref()) {
        body["error"] = json!(error);
    }

    ImportResponse { status: 200, body }
}
