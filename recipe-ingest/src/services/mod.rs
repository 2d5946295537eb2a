//! External service clients
//!
//! - **http_fetcher** - pooled page fetcher with retry/backoff
//! - **notion_client** - destination store over the Notion REST API

pub mod http_fetcher;
pub mod notion_client;

pub use http_fetcher::{FetchError, HttpFetcher, RetryPolicy};
pub use notion_client::{DestinationStore, NotionClient, StoreError};
