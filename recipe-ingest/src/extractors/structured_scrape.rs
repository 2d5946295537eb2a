//! Structured Scrape (S1)
//!
//! Reads schema.org markup through a host-bound capability profile. Each
//! field is extracted independently; the partial record is always returned,
//! with failed required fields listed in `missing_required`.

use super::page::{
    run_capabilities, schema_category, schema_cuisine, schema_image, schema_ingredients,
    schema_instructions, schema_nutrients, schema_prep_time, schema_title, schema_total_time,
    schema_yields, FieldCapabilities, FieldError, RecipePage,
};
use crate::services::http_fetcher::HttpFetcher;
use crate::types::{ExtractionStrategy, Field, SourceTag, StrategyError, StrategyOutput};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::Selector;
use std::sync::Arc;
use tracing::debug;

/// Generic profile: every field read from the schema.org Recipe node
pub const SCHEMA_ORG_PROFILE: FieldCapabilities = FieldCapabilities {
    title: schema_title,
    ingredients: schema_ingredients,
    instructions: schema_instructions,
    total_time: Some(schema_total_time),
    prep_time: Some(schema_prep_time),
    yields: Some(schema_yields),
    image: Some(schema_image),
    nutrients: Some(schema_nutrients),
    cuisine: Some(schema_cuisine),
    category: Some(schema_category),
};

/// WP Recipe Maker sites: schema first, plugin markup for the lists
pub const WPRM_PROFILE: FieldCapabilities = FieldCapabilities {
    ingredients: wprm_ingredients,
    instructions: wprm_instructions,
    ..SCHEMA_ORG_PROFILE
};

/// Hosts bound to the WP Recipe Maker profile
const WPRM_HOSTS: &[&str] = &["redhousespice.com", "sugarhero.com", "simplyquinoa.com"];

static WPRM_INGREDIENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".wprm-recipe-ingredient").expect("valid selector"));

static WPRM_INSTRUCTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".wprm-recipe-instruction-text").expect("valid selector"));

fn wprm_ingredients(page: &RecipePage) -> Result<Vec<String>, FieldError> {
    schema_ingredients(page).or_else(|_| {
        let items = page.select_text(&WPRM_INGREDIENT);
        if items.is_empty() {
            Err(FieldError::NotFound(Field::Ingredients))
        } else {
            Ok(items)
        }
    })
}

fn wprm_instructions(page: &RecipePage) -> Result<Vec<String>, FieldError> {
    schema_instructions(page).or_else(|_| {
        let steps = page.select_text(&WPRM_INSTRUCTION);
        if steps.is_empty() {
            Err(FieldError::NotFound(Field::Instructions))
        } else {
            Ok(steps)
        }
    })
}

/// Scraper profile selected by host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostProfile {
    SchemaOrg,
    WpRecipeMaker,
}

impl HostProfile {
    /// Profile bound to a host (subdomains included)
    pub fn for_host(host: &str) -> Self {
        let host = host.trim_start_matches("www.");
        let bound = WPRM_HOSTS
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)));
        if bound {
            HostProfile::WpRecipeMaker
        } else {
            HostProfile::SchemaOrg
        }
    }

    pub fn capabilities(self) -> FieldCapabilities {
        match self {
            HostProfile::SchemaOrg => SCHEMA_ORG_PROFILE,
            HostProfile::WpRecipeMaker => WPRM_PROFILE,
        }
    }
}

/// Extract with the host's profile from already-fetched HTML
pub fn scrape_html(url: &Url, html: &str) -> StrategyOutput {
    let page = RecipePage::parse(url.clone(), html);
    let profile = HostProfile::for_host(page.host().unwrap_or_default());
    run_capabilities(&page, &profile.capabilities(), SourceTag::SchemaOrg)
}

/// S1 strategy
pub struct StructuredScrapeStrategy {
    fetcher: Arc<HttpFetcher>,
}

impl StructuredScrapeStrategy {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for StructuredScrapeStrategy {
    fn name(&self) -> &'static str {
        "structured_scrape"
    }

    async fn extract(&self, url: &Url) -> Result<Option<StrategyOutput>, StrategyError> {
        let html = self.fetcher.fetch_html(url).await?;
        let output = scrape_html(url, &html);
        debug!(
            url = %url,
            fields = output.record.present_fields().len(),
            missing_required = ?output.missing_required,
            "Structured scrape complete"
        );
        Ok(Some(output))
    }
}
