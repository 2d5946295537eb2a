//! Page model and per-strategy field capability records
//!
//! A strategy declares which field extractors it supports as a
//! `FieldCapabilities` record. Required fields always have an extractor;
//! optional fields are `Option<fn>` so an unsupported field is visible at the
//! type level instead of being probed at runtime.

use super::schema;
use crate::types::{Cuisine, Field, Nutrients, SourceTag, StrategyOutput};
use reqwest::Url;
use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Per-field extraction failure
///
/// Never escapes a strategy: it becomes a `NOT_FOUND` provenance entry.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("{0} not found")]
    NotFound(Field),

    #[error("{field}: {reason}")]
    Invalid { field: Field, reason: String },
}

/// Fetched page plus its located schema.org Recipe node
pub struct RecipePage {
    pub url: Url,
    pub document: Html,
    /// Recipe node from JSON-LD, falling back to microdata
    pub schema: Option<Value>,
}

impl RecipePage {
    pub fn parse(url: Url, html: &str) -> Self {
        let document = Html::parse_document(html);
        let schema = schema::recipe_from_json_ld(&document)
            .or_else(|| schema::recipe_from_microdata(&document));
        debug!(url = %url, has_schema = schema.is_some(), "Parsed page");
        Self { url, document, schema }
    }

    /// Recipe node, or `NotFound(field)` when the page has none
    pub fn schema_node(&self, field: Field) -> Result<&Value, FieldError> {
        self.schema.as_ref().ok_or(FieldError::NotFound(field))
    }

    /// Text of every element matching `selector`, cleaned, blanks dropped
    pub fn select_text(&self, selector: &Selector) -> Vec<String> {
        schema::clean_lines(
            self.document
                .select(selector)
                .map(|el| el.text().collect::<Vec<_>>().join(" ")),
        )
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str().map(|h| h.trim_start_matches("www."))
    }
}

pub type Extractor<T> = fn(&RecipePage) -> Result<T, FieldError>;

/// Field extractors a strategy supports
#[derive(Clone, Copy)]
pub struct FieldCapabilities {
    pub title: Extractor<String>,
    pub ingredients: Extractor<Vec<String>>,
    pub instructions: Extractor<Vec<String>>,
    pub total_time: Option<Extractor<u32>>,
    pub prep_time: Option<Extractor<u32>>,
    pub yields: Option<Extractor<String>>,
    pub image: Option<Extractor<String>>,
    pub nutrients: Option<Extractor<Nutrients>>,
    pub cuisine: Option<Extractor<Cuisine>>,
    pub category: Option<Extractor<String>>,
}

/// Run every capability against `page`, isolating failures per field
///
/// Successful fields are tagged `source`; failed or unsupported ones are
/// tagged `NOT_FOUND`. Failed required fields are also listed in
/// `missing_required`. `url`/`host` are stamped only when some content was
/// found.
pub fn run_capabilities(
    page: &RecipePage,
    caps: &FieldCapabilities,
    source: SourceTag,
) -> StrategyOutput {
    let mut output = StrategyOutput::default();

    apply(&mut output, page, Field::Title, Some(caps.title), source, |r, v| r.title = Some(v));
    apply(&mut output, page, Field::Ingredients, Some(caps.ingredients), source, |r, v| {
        r.ingredients = v
    });
    apply(&mut output, page, Field::Instructions, Some(caps.instructions), source, |r, v| {
        r.instructions = v
    });
    apply(&mut output, page, Field::TotalTime, caps.total_time, source, |r, v| {
        r.total_time = Some(v)
    });
    apply(&mut output, page, Field::PrepTime, caps.prep_time, source, |r, v| {
        r.prep_time = Some(v)
    });
    apply(&mut output, page, Field::Yields, caps.yields, source, |r, v| r.yields = Some(v));
    apply(&mut output, page, Field::Image, caps.image, source, |r, v| r.image = Some(v));
    apply(&mut output, page, Field::Nutrients, caps.nutrients, source, |r, v| r.nutrients = v);
    apply(&mut output, page, Field::Cuisine, caps.cuisine, source, |r, v| r.cuisine = Some(v));
    apply(&mut output, page, Field::Category, caps.category, source, |r, v| {
        r.category = Some(v)
    });

    if output.record.has_content() {
        output.stamp_origin(&page.url, source);
    }
    output
}

fn apply<T>(
    output: &mut StrategyOutput,
    page: &RecipePage,
    field: Field,
    extractor: Option<Extractor<T>>,
    source: SourceTag,
    set: impl FnOnce(&mut crate::types::RecipeRecord, T),
) {
    let result = match extractor {
        Some(extract) => extract(page),
        None => Err(FieldError::NotFound(field)),
    };

    match result {
        Ok(value) => {
            set(&mut output.record, value);
            if output.record.has_field(field) {
                output.tag(field, source);
                return;
            }
            // Extracted but blank; clear so the record stays consistent
            output.record.copy_field_from(&Default::default(), field);
        }
        Err(e) => debug!(field = %field, error = %e, "Field extraction failed"),
    }

    output.tag(field, SourceTag::NotFound);
    if Field::REQUIRED.contains(&field) {
        output.missing_required.push(field);
    }
}

// ============================================================================
// Shared schema.org extractors
// ============================================================================

fn non_empty<T>(field: Field, value: Option<T>) -> Result<T, FieldError> {
    value.ok_or(FieldError::NotFound(field))
}

fn non_empty_list(field: Field, list: Vec<String>) -> Result<Vec<String>, FieldError> {
    if list.is_empty() {
        Err(FieldError::NotFound(field))
    } else {
        Ok(list)
    }
}

pub fn schema_title(page: &RecipePage) -> Result<String, FieldError> {
    non_empty(Field::Title, schema::title(page.schema_node(Field::Title)?))
}

pub fn schema_ingredients(page: &RecipePage) -> Result<Vec<String>, FieldError> {
    non_empty_list(Field::Ingredients, schema::ingredients(page.schema_node(Field::Ingredients)?))
}

pub fn schema_instructions(page: &RecipePage) -> Result<Vec<String>, FieldError> {
    non_empty_list(
        Field::Instructions,
        schema::instructions(page.schema_node(Field::Instructions)?),
    )
}

pub fn schema_total_time(page: &RecipePage) -> Result<u32, FieldError> {
    non_empty(Field::TotalTime, schema::total_time(page.schema_node(Field::TotalTime)?))
}

pub fn schema_prep_time(page: &RecipePage) -> Result<u32, FieldError> {
    non_empty(Field::PrepTime, schema::prep_time(page.schema_node(Field::PrepTime)?))
}

pub fn schema_yields(page: &RecipePage) -> Result<String, FieldError> {
    non_empty(Field::Yields, schema::yields(page.schema_node(Field::Yields)?))
}

pub fn schema_image(page: &RecipePage) -> Result<String, FieldError> {
    let raw = non_empty(Field::Image, schema::image(page.schema_node(Field::Image)?))?;
    // Relative image paths are resolved against the page
    page.url
        .join(&raw)
        .map(|u| u.to_string())
        .map_err(|e| FieldError::Invalid {
            field: Field::Image,
            reason: e.to_string(),
        })
}

pub fn schema_nutrients(page: &RecipePage) -> Result<Nutrients, FieldError> {
    let map = schema::nutrients(page.schema_node(Field::Nutrients)?);
    if map.is_empty() {
        Err(FieldError::NotFound(Field::Nutrients))
    } else {
        Ok(map)
    }
}

pub fn schema_cuisine(page: &RecipePage) -> Result<Cuisine, FieldError> {
    non_empty(Field::Cuisine, schema::cuisine(page.schema_node(Field::Cuisine)?))
}

pub fn schema_category(page: &RecipePage) -> Result<String, FieldError> {
    non_empty(Field::Category, schema::category(page.schema_node(Field::Category)?))
}
