//! In-memory destination store that records every call

use async_trait::async_trait;
use recipe_ingest::services::{DestinationStore, StoreError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    UpdatePage {
        page_id: String,
        properties: Value,
        cover: Option<Value>,
    },
    ListChildren(String),
    DeleteBlock(String),
    AppendChildren {
        block_id: String,
        blocks: Vec<Value>,
    },
    FindPage {
        database_id: String,
        number: u64,
    },
}

#[derive(Default)]
pub struct MockStore {
    calls: Mutex<Vec<StoreCall>>,
    /// Children returned by `list_children`
    existing_children: Vec<String>,
    /// `Unique ID` number → page id
    unique_ids: HashMap<u64, String>,
    fail_cover: bool,
    fail_append: bool,
    fail_delete: bool,
}

fn api_error(message: &str) -> StoreError {
    StoreError::Api {
        status: 400,
        code: "validation_error".to_string(),
        message: message.to_string(),
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, ids: &[&str]) -> Self {
        self.existing_children = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_unique_id(mut self, number: u64, page_id: &str) -> Self {
        self.unique_ids.insert(number, page_id.to_string());
        self
    }

    pub fn failing_cover(mut self) -> Self {
        self.fail_cover = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn failing_append(mut self) -> Self {
        self.fail_append = true;
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Blocks from every append, in order
    pub fn appended_blocks(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::AppendChildren { blocks, .. } => Some(blocks),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Properties from the first page update
    pub fn written_properties(&self) -> Option<Value> {
        self.calls().into_iter().find_map(|c| match c {
            StoreCall::UpdatePage { properties, cover: None, .. } => Some(properties),
            _ => None,
        })
    }

    pub fn written_cover(&self) -> Option<Value> {
        self.calls().into_iter().find_map(|c| match c {
            StoreCall::UpdatePage { cover: Some(cover), .. } => Some(cover),
            _ => None,
        })
    }

    pub fn deleted_blocks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::DeleteBlock(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DestinationStore for MockStore {
    async fn update_page(
        &self,
        page_id: &str,
        properties: &Value,
        cover: Option<&Value>,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::UpdatePage {
            page_id: page_id.to_string(),
            properties: properties.clone(),
            cover: cover.cloned(),
        });
        if cover.is_some() && self.fail_cover {
            return Err(api_error("Invalid image url"));
        }
        Ok(())
    }

    async fn list_children(&self, block_id: &str) -> Result<Vec<String>, StoreError> {
        self.record(StoreCall::ListChildren(block_id.to_string()));
        Ok(self.existing_children.clone())
    }

    async fn delete_block(&self, block_id: &str) -> Result<(), StoreError> {
        self.record(StoreCall::DeleteBlock(block_id.to_string()));
        if self.fail_delete {
            return Err(api_error("Block is archived"));
        }
        Ok(())
    }

    async fn append_children(&self, block_id: &str, blocks: &[Value]) -> Result<(), StoreError> {
        self.record(StoreCall::AppendChildren {
            block_id: block_id.to_string(),
            blocks: blocks.to_vec(),
        });
        if self.fail_append {
            return Err(StoreError::Transport("connection reset".to_string()));
        }
        Ok(())
    }

    async fn find_page_by_unique_id(
        &self,
        database_id: &str,
        number: u64,
    ) -> Result<Option<String>, StoreError> {
        self.record(StoreCall::FindPage {
            database_id: database_id.to_string(),
            number,
        });
        Ok(self.unique_ids.get(&number).cloned())
    }
}
