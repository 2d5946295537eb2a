//! Core Types and Trait Definitions for recipe extraction
//!
//! Defines the data model shared by the extraction cascade:
//! - **RecipeRecord:** the partial or complete recipe produced by a strategy
//! - **ProvenanceMap:** which strategy supplied each field
//! - **ExtractionStrategy:** the trait every strategy implements
//! - **ExtractionResult:** what the orchestrator hands to the result consumer
//!
//! # Architecture
//! Strategies (structured scrape → direct JSON-LD → wild mode → model fallback)
//! produce `StrategyOutput`s; the orchestrator scores and merges them into one
//! `ExtractionResult`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Fields and Provenance
// ============================================================================

/// Recipe field identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Ingredients,
    Instructions,
    TotalTime,
    PrepTime,
    Yields,
    Image,
    Host,
    Nutrients,
    Cuisine,
    Category,
    Url,
    /// Sentinel key covering every field (used by the total-failure record)
    AllFields,
}

impl Field {
    /// Fields a strategy must deliver for a record to be considered complete
    pub const REQUIRED: [Field; 3] = [Field::Title, Field::Ingredients, Field::Instructions];

    /// Every concrete recipe field, in presentation order
    pub const ALL: [Field; 12] = [
        Field::Title,
        Field::Ingredients,
        Field::Instructions,
        Field::TotalTime,
        Field::PrepTime,
        Field::Yields,
        Field::Image,
        Field::Host,
        Field::Nutrients,
        Field::Cuisine,
        Field::Category,
        Field::Url,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Ingredients => "ingredients",
            Field::Instructions => "instructions",
            Field::TotalTime => "total_time",
            Field::PrepTime => "prep_time",
            Field::Yields => "yields",
            Field::Image => "image",
            Field::Host => "host",
            Field::Nutrients => "nutrients",
            Field::Cuisine => "cuisine",
            Field::Category => "category",
            Field::Url => "url",
            Field::AllFields => "all_fields",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a field value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceTag {
    /// Structured scrape of schema.org markup
    #[serde(rename = "schema.org")]
    SchemaOrg,
    /// Direct parse of embedded JSON-LD
    #[serde(rename = "json-ld")]
    JsonLd,
    /// Heuristic extraction without standards-compliant markup
    #[serde(rename = "wild_mode")]
    WildMode,
    /// Generative model fallback
    #[serde(rename = "llm")]
    Llm,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "ERROR")]
    Error,
    /// Tag not known to this build (e.g. from a newer producer)
    #[serde(rename = "unknown", other)]
    Unrecognized,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::SchemaOrg => "schema.org",
            SourceTag::JsonLd => "json-ld",
            SourceTag::WildMode => "wild_mode",
            SourceTag::Llm => "llm",
            SourceTag::NotFound => "NOT_FOUND",
            SourceTag::Error => "ERROR",
            SourceTag::Unrecognized => "unknown",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field provenance
///
/// Every field present in a `RecipeRecord` has an entry; absent fields may
/// carry `NOT_FOUND`/`ERROR` explaining the gap.
pub type ProvenanceMap = BTreeMap<Field, SourceTag>;

/// Nutrient name → value (e.g. "protein" → "12 g")
pub type Nutrients = BTreeMap<String, String>;

// ============================================================================
// Recipe Record
// ============================================================================

/// Cuisine as published: a single (possibly comma separated) string or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cuisine {
    One(String),
    Many(Vec<String>),
}

impl Cuisine {
    /// Individual cuisine tags, comma separated strings split apart
    pub fn tags(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Cuisine::One(s) => vec![s.as_str()],
            Cuisine::Many(list) => list.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn is_blank(&self) -> bool {
        self.tags().is_empty()
    }
}

/// Partial or complete recipe data
///
/// Every field is optional; strategies fill what they can.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<String>,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<u32>,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yields: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nutrients: Nutrients,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<Cuisine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn has_lines(values: &[String]) -> bool {
    values.iter().any(|s| !s.trim().is_empty())
}

impl RecipeRecord {
    /// Whether `field` holds a usable (non-empty, non-zero) value
    ///
    /// Whitespace-only strings and lists made only of blank lines count as
    /// absent.
    pub fn has_field(&self, field: Field) -> bool {
        match field {
            Field::Title => has_text(&self.title),
            Field::Ingredients => has_lines(&self.ingredients),
            Field::Instructions => has_lines(&self.instructions),
            Field::TotalTime => self.total_time.is_some_and(|t| t > 0),
            Field::PrepTime => self.prep_time.is_some_and(|t| t > 0),
            Field::Yields => has_text(&self.yields),
            Field::Image => has_text(&self.image),
            Field::Host => has_text(&self.host),
            Field::Nutrients => !self.nutrients.is_empty(),
            Field::Cuisine => self.cuisine.as_ref().is_some_and(|c| !c.is_blank()),
            Field::Category => has_text(&self.category),
            Field::Url => has_text(&self.url),
            Field::AllFields => false,
        }
    }

    /// Fields currently holding a usable value
    pub fn present_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.has_field(*f))
            .collect()
    }

    /// Whether any recipe content was found (`url`/`host` alone do not count)
    pub fn has_content(&self) -> bool {
        Field::ALL
            .into_iter()
            .filter(|f| !matches!(f, Field::Url | Field::Host))
            .any(|f| self.has_field(f))
    }

    /// Usable by the result consumer: title and ingredients present
    pub fn is_usable(&self) -> bool {
        self.has_field(Field::Title) && self.has_field(Field::Ingredients)
    }

    /// Copy one field's value from `other`, replacing the current value
    pub fn copy_field_from(&mut self, other: &RecipeRecord, field: Field) {
        match field {
            Field::Title => self.title = other.title.clone(),
            Field::Ingredients => self.ingredients = other.ingredients.clone(),
            Field::Instructions => self.instructions = other.instructions.clone(),
            Field::TotalTime => self.total_time = other.total_time,
            Field::PrepTime => self.prep_time = other.prep_time,
            Field::Yields => self.yields = other.yields.clone(),
            Field::Image => self.image = other.image.clone(),
            Field::Host => self.host = other.host.clone(),
            Field::Nutrients => self.nutrients = other.nutrients.clone(),
            Field::Cuisine => self.cuisine = other.cuisine.clone(),
            Field::Category => self.category = other.category.clone(),
            Field::Url => self.url = other.url.clone(),
            Field::AllFields => {}
        }
    }
}

// ============================================================================
// Strategy Trait
// ============================================================================

/// What a strategy produced for one URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyOutput {
    pub record: RecipeRecord,
    pub provenance: ProvenanceMap,
    /// Required fields the strategy could not extract (structured scrape only)
    pub missing_required: Vec<Field>,
}

impl StrategyOutput {
    /// Record a successfully extracted field
    pub fn tag(&mut self, field: Field, source: SourceTag) {
        self.provenance.insert(field, source);
    }

    /// Set `url` and `host` from the page URL, tagged with `source`
    pub fn stamp_origin(&mut self, url: &Url, source: SourceTag) {
        self.record.url = Some(url.to_string());
        self.tag(Field::Url, source);
        if let Some(host) = url.host_str() {
            self.record.host = Some(host.trim_start_matches("www.").to_string());
            self.tag(Field::Host, source);
        }
    }
}

/// Strategy-level failure
///
/// Only these errors are recovered at the orchestrator boundary; the stage is
/// then treated as having produced no data.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// Page or API could not be fetched
    #[error("Network error: {0}")]
    Network(String),

    /// Response could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generative model call failed
    #[error("Model error: {0}")]
    Model(String),

    /// Strategy cannot run in this configuration (e.g. no API key)
    #[error("Not available: {0}")]
    NotAvailable(String),
}

/// One self-contained extraction technique
///
/// # Example
/// ```rust,ignore
/// let output = strategy.extract(&url).await?;
/// if let Some(output) = output {
///     println!("{} fields", output.record.present_fields().len());
/// }
/// ```
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Strategy name for logging and the stage trail
    fn name(&self) -> &'static str;

    /// Extract a partial recipe
    ///
    /// # Returns
    /// * `Ok(Some(output))` - partial record with provenance
    /// * `Ok(None)` - strategy ran but found nothing
    ///
    /// # Errors
    /// Returns `StrategyError` when the strategy as a whole could not run.
    async fn extract(&self, url: &Url) -> Result<Option<StrategyOutput>, StrategyError>;
}

// ============================================================================
// Extraction Result
// ============================================================================

/// How a single orchestrator stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Produced data that was adopted or merged
    Produced,
    /// Ran without producing data
    NoData,
    /// Raised a strategy-level error
    Failed,
}

/// Stage trail entry for the provenance report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub strategy: String,
    pub outcome: StageOutcome,
    /// Score of `best_data` after this stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Final output of one orchestration run
///
/// Created fresh per URL and immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub run_id: Uuid,
    pub url: String,
    pub data: RecipeRecord,
    pub provenance: ProvenanceMap,
    pub confidence_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<Field>,
    #[serde(default)]
    pub stages: Vec<StageReport>,
    pub parse_timestamp: DateTime<Utc>,
}

impl ExtractionResult {
    /// Whether this is the total-failure record
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_absent() {
        let record = RecipeRecord {
            title: Some("   ".to_string()),
            instructions: vec!["".to_string(), "  \n".to_string()],
            total_time: Some(0),
            cuisine: Some(Cuisine::Many(vec![" ".to_string()])),
            ..Default::default()
        };

        assert!(!record.has_field(Field::Title));
        assert!(!record.has_field(Field::Instructions));
        assert!(!record.has_field(Field::TotalTime));
        assert!(!record.has_field(Field::Cuisine));
        assert!(!record.has_content());
    }

    #[test]
    fn test_url_and_host_are_not_content() {
        let url = Url::parse("https://www.example.com/recipes/1").unwrap();
        let mut output = StrategyOutput::default();
        output.stamp_origin(&url, SourceTag::JsonLd);

        assert_eq!(output.record.host.as_deref(), Some("example.com"));
        assert_eq!(output.provenance.get(&Field::Url), Some(&SourceTag::JsonLd));
        assert!(!output.record.has_content());
    }

    #[test]
    fn test_cuisine_tags_split_commas() {
        let cuisine = Cuisine::Many(vec!["Mexican, Tex-Mex".to_string(), "Vegan".to_string()]);
        assert_eq!(cuisine.tags(), vec!["Mexican", "Tex-Mex", "Vegan"]);
    }

    #[test]
    fn test_source_tag_serialization() {
        assert_eq!(serde_json::to_string(&SourceTag::SchemaOrg).unwrap(), "\"schema.org\"");
        assert_eq!(serde_json::to_string(&SourceTag::NotFound).unwrap(), "\"NOT_FOUND\"");

        let tag: SourceTag = serde_json::from_str("\"microdata\"").unwrap();
        assert_eq!(tag, SourceTag::Unrecognized);
    }

    #[test]
    fn test_provenance_keys_serialize_as_field_names() {
        let mut provenance = ProvenanceMap::new();
        provenance.insert(Field::AllFields, SourceTag::Error);
        provenance.insert(Field::TotalTime, SourceTag::WildMode);

        let json = serde_json::to_value(&provenance).unwrap();
        assert_eq!(json["all_fields"], "ERROR");
        assert_eq!(json["total_time"], "wild_mode");
    }
}
