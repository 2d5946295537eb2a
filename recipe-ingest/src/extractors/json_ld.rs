//! Direct JSON-LD Parse (S2)
//!
//! Scans `application/ld+json` blocks (arrays, `@graph` containers and
//! `mainEntity` wrappers included) for a Recipe-typed object and maps its
//! properties one-to-one. Microdata is not consulted.

use super::schema;
use crate::services::http_fetcher::HttpFetcher;
use crate::types::{ExtractionStrategy, Field, SourceTag, StrategyError, StrategyOutput};
use async_trait::async_trait;
use reqwest::Url;
use scraper::Html;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Map a Recipe node onto a fresh record, tagging every mapped field `json-ld`
pub fn map_recipe_node(node: &Value, url: &Url) -> StrategyOutput {
    let mut output = StrategyOutput::default();
    let record = &mut output.record;

    record.title = schema::title(node);
    record.ingredients = schema::ingredients(node);
    record.instructions = schema::instructions(node);
    record.total_time = schema::total_time(node);
    record.prep_time = schema::prep_time(node);
    record.yields = schema::yields(node);
    record.image = schema::image(node).and_then(|raw| url.join(&raw).ok().map(|u| u.to_string()));
    record.nutrients = schema::nutrients(node);
    record.cuisine = schema::cuisine(node);
    record.category = schema::category(node);

    for field in output.record.present_fields() {
        output.tag(field, SourceTag::JsonLd);
    }
    output.stamp_origin(url, SourceTag::JsonLd);
    output
}

/// Parse already-fetched HTML; `None` when no Recipe object is embedded
pub fn parse_html(url: &Url, html: &str) -> Option<StrategyOutput> {
    let document = Html::parse_document(html);
    let node = schema::recipe_from_json_ld(&document)?;
    Some(map_recipe_node(&node, url))
}

/// S2 strategy
pub struct JsonLdStrategy {
    fetcher: Arc<HttpFetcher>,
}

impl JsonLdStrategy {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for JsonLdStrategy {
    fn name(&self) -> &'static str {
        "json_ld"
    }

    async fn extract(&self, url: &Url) -> Result<Option<StrategyOutput>, StrategyError> {
        let html = match self.fetcher.fetch_html(url).await {
            Ok(html) => html,
            Err(e) => {
                // A failed fetch is a null result for this stage
                debug!(url = %url, error = %e, "JSON-LD fetch failed");
                return Ok(None);
            }
        };

        let output = parse_html(url, &html);
        match &output {
            Some(o) => debug!(
                url = %url,
                fields = o.record.present_fields().len(),
                has_title = o.record.has_field(Field::Title),
                "Recipe object found in JSON-LD"
            ),
            None => debug!(url = %url, "No Recipe object in JSON-LD"),
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://cooking.example.org/recipes/42").unwrap()
    }

    #[test]
    fn test_graph_recipe_maps_all_fields() {
        let html = r#"
            <script type="application/ld+json">
            {"@context": "https://schema.org", "@graph": [
              {"@type": "WebSite", "name": "Example"},
              {"@type": "Recipe",
               "name": "Lentil Soup",
               "recipeIngredient": ["1 cup lentils", "4 cups stock"],
               "recipeInstructions": "Rinse lentils.\nSimmer 30 minutes.",
               "totalTime": "PT45M",
               "recipeYield": "6",
               "image": {"@type": "ImageObject", "url": "https://img.example.org/soup.jpg"},
               "nutrition": {"@type": "NutritionInformation", "calories": "180 kcal", "fiberContent": "8 g"},
               "recipeCuisine": "Middle Eastern",
               "recipeCategory": ["Soup", "Main"]}
            ]}
            </script>"#;

        let output = parse_html(&url(), html).unwrap();
        let r = &output.record;
        assert_eq!(r.title.as_deref(), Some("Lentil Soup"));
        assert_eq!(r.instructions, vec!["Rinse lentils.", "Simmer 30 minutes."]);
        assert_eq!(r.total_time, Some(45));
        assert_eq!(r.yields.as_deref(), Some("6 servings"));
        assert_eq!(r.nutrients.get("fiber").map(String::as_str), Some("8 g"));
        assert_eq!(r.category.as_deref(), Some("Soup, Main"));
        assert_eq!(output.provenance[&Field::Nutrients], SourceTag::JsonLd);
        assert_eq!(output.provenance[&Field::Host], SourceTag::JsonLd);
        assert!(!output.provenance.contains_key(&Field::PrepTime));
    }

    #[test]
    fn test_no_recipe_object_is_none() {
        let html = r#"<script type="application/ld+json">{"@type": "Article"}</script>"#;
        assert!(parse_html(&url(), html).is_none());
        assert!(parse_html(&url(), "<p>plain page</p>").is_none());
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let html = r#"
            <script type="application/ld+json">{ not json </script>
            <script type="application/ld+json">[{"@type": "Recipe", "name": "Tea"}]</script>"#;
        let output = parse_html(&url(), html).unwrap();
        assert_eq!(output.record.title.as_deref(), Some("Tea"));
    }
}
