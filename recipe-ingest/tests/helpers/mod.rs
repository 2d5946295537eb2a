//! Test Helper Utilities
//!
//! Shared utilities for testing recipe-ingest without network access

#![allow(dead_code)]

pub mod mock_store;
pub mod pages;
pub mod strategies;

pub use mock_store::{MockStore, StoreCall};
pub use strategies::{fixture_orchestrator, offline_orchestrator, CannedStrategy};
