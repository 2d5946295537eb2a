//! Validation Layer
//!
//! Scores the quality of extracted recipe data.
//!
//! # Validators
//! 1. **confidence_scorer** - weighted, provenance-aware confidence score

pub mod confidence_scorer;

pub use confidence_scorer::{score, source_multiplier, HIGH_CONFIDENCE, LOW_CONFIDENCE, MEDIUM_CONFIDENCE};
