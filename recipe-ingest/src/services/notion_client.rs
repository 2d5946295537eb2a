//! Notion Destination Store
//!
//! Thin client over the Notion REST API covering the calls the import workflow
//! needs: page property/cover updates, child block listing, deletion and
//! appends, and the `Unique ID` database lookup.
//!
//! **API details:**
//! - Bearer token auth, `Notion-Version` header on every request
//! - Child listing follows `next_cursor` pagination
//! - Appends are batched at 100 blocks per request (API limit)

use async_trait::async_trait;
use recipe_common::config::{redact, NotionConfig};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

/// Maximum children per append request
pub const APPEND_BATCH_SIZE: usize = 100;

/// Destination store error
#[derive(Debug, Error)]
pub enum StoreError {
    /// No integration token configured
    #[error("Notion API key not configured")]
    NotConfigured,

    /// Connection or timeout failure
    #[error("Notion request failed: {0}")]
    Transport(String),

    /// API answered with an error object
    #[error("Notion API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Unexpected Notion response: {0}")]
    Decode(String),
}

/// Document store the import workflow writes to
///
/// Properties, covers and blocks are passed as API-shaped JSON produced by
/// the renderer.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Update page properties and, optionally, the cover
    async fn update_page(
        &self,
        page_id: &str,
        properties: &Value,
        cover: Option<&Value>,
    ) -> Result<(), StoreError>;

    /// Ids of the direct children of a block (or page)
    async fn list_children(&self, block_id: &str) -> Result<Vec<String>, StoreError>;

    async fn delete_block(&self, block_id: &str) -> Result<(), StoreError>;

    /// Append blocks in order
    async fn append_children(&self, block_id: &str, blocks: &[Value]) -> Result<(), StoreError>;

    /// Page whose `Unique ID` property has the given number
    async fn find_page_by_unique_id(
        &self,
        database_id: &str,
        number: u64,
    ) -> Result<Option<String>, StoreError>;
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ObjectList {
    results: Vec<ObjectRef>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct ObjectRef {
    id: String,
}

/// Notion REST client
pub struct NotionClient {
    client: Client,
    api_url: String,
    api_version: String,
    api_key: String,
}

impl NotionClient {
    /// Build from configuration, reusing the process-wide HTTP client
    pub fn new(client: Client, config: &NotionConfig) -> Result<Self, StoreError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(StoreError::NotConfigured)?;

        info!(key = %redact(&api_key), version = %config.api_version, "Notion client initialized");

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            api_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.api_url, path))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.api_version)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !status.is_success() {
            let detail: ApiErrorBody = serde_json::from_str(&body).unwrap_or(ApiErrorBody {
                code: "unknown".to_string(),
                message: body.clone(),
            });
            return Err(StoreError::Api {
                status: status.as_u16(),
                code: detail.code,
                message: detail.message,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

fn decode_list(value: Value) -> Result<ObjectList, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl DestinationStore for NotionClient {
    async fn update_page(
        &self,
        page_id: &str,
        properties: &Value,
        cover: Option<&Value>,
    ) -> Result<(), StoreError> {
        let mut body = json!({ "properties": properties });
        if let Some(cover) = cover {
            body["cover"] = cover.clone();
        }
        debug!(page_id, has_cover = cover.is_some(), "Updating page");
        self.send(self.request(Method::PATCH, &format!("pages/{}", page_id)).json(&body))
            .await?;
        Ok(())
    }

    async fn list_children(&self, block_id: &str) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut builder = self
                .request(Method::GET, &format!("blocks/{}/children", block_id))
                .query(&[("page_size", "100")]);
            if let Some(c) = &cursor {
                builder = builder.query(&[("start_cursor", c.as_str())]);
            }

            let page = decode_list(self.send(builder).await?)?;
            ids.extend(page.results.into_iter().map(|r| r.id));

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        debug!(block_id, count = ids.len(), "Listed child blocks");
        Ok(ids)
    }

    async fn delete_block(&self, block_id: &str) -> Result<(), StoreError> {
        self.send(self.request(Method::DELETE, &format!("blocks/{}", block_id)))
            .await?;
        Ok(())
    }

    async fn append_children(&self, block_id: &str, blocks: &[Value]) -> Result<(), StoreError> {
        for (i, batch) in blocks.chunks(APPEND_BATCH_SIZE).enumerate() {
            debug!(block_id, batch = i, size = batch.len(), "Appending blocks");
            let body = json!({ "children": batch });
            self.send(
                self.request(Method::PATCH, &format!("blocks/{}/children", block_id))
                    .json(&body),
            )
            .await?;
        }
        Ok(())
    }

    async fn find_page_by_unique_id(
        &self,
        database_id: &str,
        number: u64,
    ) -> Result<Option<String>, StoreError> {
        let body = json!({
            "filter": {
                "property": "Unique ID",
                "unique_id": { "equals": number }
            }
        });
        let value = self
            .send(
                self.request(Method::POST, &format!("databases/{}/query", database_id))
                    .json(&body),
            )
            .await?;
        let list = decode_list(value)?;
        Ok(list.results.into_iter().next().map(|r| r.id))
    }
}
