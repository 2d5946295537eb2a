//! # Recipe Ingest Common Library
//!
//! Shared code for the recipe ingest service:
//! - Error type used by configuration loading
//! - TOML + environment configuration
//! - Logging configuration

pub mod config;
pub mod error;

pub use error::{Error, Result};
