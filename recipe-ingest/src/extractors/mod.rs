//! Extraction Strategies
//!
//! Four independent strategies, each a function from a URL to a partial
//! recipe record plus per-field provenance. They are ordered by decreasing
//! reliability and run sequentially by the orchestrator.
//!
//! # Strategies
//! 1. **structured_scrape** - schema.org markup through a host-bound profile (`schema.org`)
//! 2. **json_ld** - direct parse of embedded JSON-LD (`json-ld`)
//! 3. **wild_mode** - schema first, then page heuristics (`wild_mode`)
//! 4. **llm_fallback** - generative model over a bounded HTML prefix (`llm`)
//!
//! # Error isolation
//! Per-field failures are caught inside a strategy and tagged `NOT_FOUND`.
//! Only `StrategyError` (network, parse, model, not available) leaves a
//! strategy; the orchestrator treats it as "no data" for that stage.

pub mod duration;
pub mod json_ld;
pub mod llm_fallback;
pub mod page;
pub mod schema;
pub mod structured_scrape;
pub mod wild_mode;

pub use json_ld::JsonLdStrategy;
pub use llm_fallback::{LlmFallbackStrategy, OpenAiChatClient, TextModel};
pub use structured_scrape::StructuredScrapeStrategy;
pub use wild_mode::WildModeStrategy;

// ============================================================================
// Mock Strategy for Testing
// ============================================================================
