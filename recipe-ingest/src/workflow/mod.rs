//! Workflow orchestration
//!
//! - **orchestrator** - sequential strategy cascade with confidence-gated early exit
//! - **importer** - webhook event → extraction → destination page update

pub mod importer;
pub mod orchestrator;

pub use importer::{ImportResponse, RecipeImporter};
pub use orchestrator::ExtractionOrchestrator;
