//! Heuristic "wild mode" Parse (S3)
//!
//! Same field set as the structured scrape, but every extractor falls back to
//! pattern matching when the page has no usable schema.org markup: meta tags,
//! headings, class names, and label text such as "Total Time" or "Serves".

use super::duration::parse_human_minutes;
use super::page::{
    run_capabilities, schema_category, schema_cuisine, schema_image, schema_ingredients,
    schema_instructions, schema_nutrients, schema_prep_time, schema_title, schema_total_time,
    schema_yields, FieldCapabilities, FieldError, RecipePage,
};
use super::schema::clean_text;
use crate::services::http_fetcher::HttpFetcher;
use crate::types::{ExtractionStrategy, Field, SourceTag, StrategyError, StrategyOutput};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Selector};
use std::sync::Arc;
use tracing::debug;

pub const WILD_PROFILE: FieldCapabilities = FieldCapabilities {
    title: wild_title,
    ingredients: wild_ingredients,
    instructions: wild_instructions,
    total_time: Some(wild_total_time),
    prep_time: Some(wild_prep_time),
    yields: Some(wild_yields),
    image: Some(wild_image),
    nutrients: Some(schema_nutrients),
    cuisine: Some(schema_cuisine),
    category: Some(schema_category),
};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static OG_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:title"]"#));
static OG_IMAGE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:image"]"#));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static LIST_ITEMS: Lazy<Selector> = Lazy::new(|| selector("li"));
static HEADINGS: Lazy<Selector> = Lazy::new(|| selector("h2, h3, h4, h5, strong"));
static LISTS: Lazy<Selector> = Lazy::new(|| selector("ul, ol"));

static INGREDIENT_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bingredients?\b").expect("valid pattern"));
static INSTRUCTION_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(instructions?|directions?|method|preparation)\b").expect("valid pattern")
});

const TIME_VALUE: &str = r"(\d+(?:\.\d+)?\s*(?:days?|hours?|hrs?|minutes?|mins?|h|m)\b(?:[\s,]*(?:and\s+)?\d+(?:\.\d+)?\s*(?:days?|hours?|hrs?|minutes?|mins?|h|m)\b)*)";

static TOTAL_TIME_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)total\s*time\s*:?\s*{}", TIME_VALUE)).expect("valid pattern")
});
static PREP_TIME_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)prep(?:aration)?\s*time\s*:?\s*{}", TIME_VALUE))
        .expect("valid pattern")
});
static YIELD_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:serves|servings|yields?|makes)\s*:?\s*(\d+(?:\s*(?:-|to)\s*\d+)?)")
        .expect("valid pattern")
});

// ============================================================================
// Heuristic helpers
// ============================================================================

fn meta_content(page: &RecipePage, sel: &Selector) -> Option<String> {
    page.document
        .select(sel)
        .filter_map(|m| m.value().attr("content"))
        .map(clean_text)
        .find(|c| !c.is_empty())
}

fn first_text(page: &RecipePage, sel: &Selector) -> Option<String> {
    page.select_text(sel).into_iter().next()
}

/// `li` elements whose class mentions any of `needles`
fn classed_items(page: &RecipePage, needles: &[&str]) -> Vec<String> {
    let items = page.document.select(&LIST_ITEMS).filter(|li| {
        li.value().classes().any(|class| {
            let class = class.to_ascii_lowercase();
            needles.iter().any(|n| class.contains(n))
        })
    });
    super::schema::clean_lines(items.map(element_text))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

/// Items of the first list following a heading that matches `pattern`
fn list_after_heading(page: &RecipePage, pattern: &Regex) -> Vec<String> {
    for heading in page.document.select(&HEADINGS) {
        if !pattern.is_match(&element_text(heading)) {
            continue;
        }

        for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
            let name = sibling.value().name();
            if matches!(name, "h1" | "h2" | "h3" | "h4" | "h5") {
                break;
            }
            let list = if matches!(name, "ul" | "ol") {
                Some(sibling)
            } else {
                sibling.select(&LISTS).next()
            };
            if let Some(list) = list {
                let items =
                    super::schema::clean_lines(list.select(&LIST_ITEMS).map(element_text));
                if !items.is_empty() {
                    return items;
                }
            }
        }
    }
    Vec::new()
}

/// Flattened visible text of the whole page
fn page_text(page: &RecipePage) -> String {
    clean_text(&element_text(page.document.root_element()))
}

fn minutes_after_label(page: &RecipePage, pattern: &Regex) -> Option<u32> {
    let text = page_text(page);
    let caps = pattern.captures(&text)?;
    parse_human_minutes(&caps[1]).filter(|m| *m > 0)
}

fn found<T>(field: Field, value: Option<T>) -> Result<T, FieldError> {
    value.ok_or(FieldError::NotFound(field))
}

fn found_list(field: Field, list: Vec<String>) -> Result<Vec<String>, FieldError> {
    if list.is_empty() {
        Err(FieldError::NotFound(field))
    } else {
        Ok(list)
    }
}

// ============================================================================
// Field extractors (schema first, heuristics second)
// ============================================================================

fn wild_title(page: &RecipePage) -> Result<String, FieldError> {
    schema_title(page).or_else(|_| {
        let title = meta_content(page, &OG_TITLE)
            .or_else(|| first_text(page, &H1))
            .or_else(|| first_text(page, &TITLE));
        found(Field::Title, title)
    })
}

fn wild_ingredients(page: &RecipePage) -> Result<Vec<String>, FieldError> {
    schema_ingredients(page).or_else(|_| {
        let mut items = classed_items(page, &["ingredient"]);
        if items.is_empty() {
            items = list_after_heading(page, &INGREDIENT_HEADING);
        }
        found_list(Field::Ingredients, items)
    })
}

fn wild_instructions(page: &RecipePage) -> Result<Vec<String>, FieldError> {
    schema_instructions(page).or_else(|_| {
        let mut steps = classed_items(page, &["instruction", "direction", "step"]);
        if steps.is_empty() {
            steps = list_after_heading(page, &INSTRUCTION_HEADING);
        }
        found_list(Field::Instructions, steps)
    })
}

fn wild_total_time(page: &RecipePage) -> Result<u32, FieldError> {
    schema_total_time(page)
        .or_else(|_| found(Field::TotalTime, minutes_after_label(page, &TOTAL_TIME_TEXT)))
}

fn wild_prep_time(page: &RecipePage) -> Result<u32, FieldError> {
    schema_prep_time(page)
        .or_else(|_| found(Field::PrepTime, minutes_after_label(page, &PREP_TIME_TEXT)))
}

fn wild_yields(page: &RecipePage) -> Result<String, FieldError> {
    schema_yields(page).or_else(|_| {
        let text = page_text(page);
        let servings = YIELD_TEXT
            .captures(&text)
            .map(|caps| format!("{} servings", &caps[1]));
        found(Field::Yields, servings)
    })
}

fn wild_image(page: &RecipePage) -> Result<String, FieldError> {
    schema_image(page).or_else(|_| found(Field::Image, meta_content(page, &OG_IMAGE)))
}

/// Heuristic extraction from already-fetched HTML
///
/// `None` when nothing beyond the page origin could be found.
pub fn parse_html(url: &Url, html: &str) -> Option<StrategyOutput> {
    let page = RecipePage::parse(url.clone(), html);
    let mut output = run_capabilities(&page, &WILD_PROFILE, SourceTag::WildMode);
    output.missing_required.clear();
    output.record.has_content().then_some(output)
}

/// S3 strategy
pub struct WildModeStrategy {
    fetcher: Arc<HttpFetcher>,
}

impl WildModeStrategy {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for WildModeStrategy {
    fn name(&self) -> &'static str {
        "wild_mode"
    }

    async fn extract(&self, url: &Url) -> Result<Option<StrategyOutput>, StrategyError> {
        let html = self.fetcher.fetch_html(url).await?;
        let output = parse_html(url, &html);
        debug!(
            url = %url,
            fields = output.as_ref().map(|o| o.record.present_fields().len()).unwrap_or(0),
            "Wild mode parse complete"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://grandmas-kitchen.example/blog/pancakes").unwrap()
    }

    #[test]
    fn test_heading_and_label_heuristics() {
        let html = r#"
            <html><head>
              <title>Pancakes | Grandma's Kitchen</title>
              <meta property="og:image" content="https://grandmas-kitchen.example/p.jpg">
            </head><body>
              <h1>Fluffy Pancakes</h1>
              <p>Prep Time: 10 mins &middot; Total Time: 1 hr 5 mins &middot; Serves 4</p>
              <h2>Ingredients</h2>
              <ul><li>2 cups flour</li><li>2 eggs</li><li>1 1/2 cups milk</li></ul>
              <h2>Directions</h2>
              <div><ol><li>Whisk everything.</li><li>Fry on a hot griddle.</li></ol></div>
            </body></html>"#;

        let output = parse_html(&url(), html).unwrap();
        let r = &output.record;
        assert_eq!(r.title.as_deref(), Some("Fluffy Pancakes"));
        assert_eq!(r.ingredients, vec!["2 cups flour", "2 eggs", "1 1/2 cups milk"]);
        assert_eq!(r.instructions, vec!["Whisk everything.", "Fry on a hot griddle."]);
        assert_eq!(r.total_time, Some(65));
        assert_eq!(r.prep_time, Some(10));
        assert_eq!(r.yields.as_deref(), Some("4 servings"));
        assert_eq!(r.image.as_deref(), Some("https://grandmas-kitchen.example/p.jpg"));
        assert_eq!(output.provenance[&Field::Title], SourceTag::WildMode);
        assert_eq!(output.provenance[&Field::Nutrients], SourceTag::NotFound);
        assert!(output.missing_required.is_empty());
    }

    #[test]
    fn test_class_name_heuristics() {
        let html = r#"
            <meta property="og:title" content="Chili">
            <ul>
              <li class="recipe-ingredient-item">1 lb beans</li>
              <li class="recipe-ingredient-item">2 cups tomatoes</li>
            </ul>
            <ol><li class="step">Simmer for an hour.</li></ol>"#;

        let output = parse_html(&url(), html).unwrap();
        assert_eq!(output.record.title.as_deref(), Some("Chili"));
        assert_eq!(output.record.ingredients.len(), 2);
        assert_eq!(output.record.instructions, vec!["Simmer for an hour."]);
    }

    #[test]
    fn test_schema_data_preferred() {
        let html = r#"
            <script type="application/ld+json">{"@type": "Recipe", "name": "Schema Name"}</script>
            <h1>Heading Name</h1>"#;
        let output = parse_html(&url(), html).unwrap();
        assert_eq!(output.record.title.as_deref(), Some("Schema Name"));
    }

    #[test]
    fn test_empty_page_is_none() {
        assert!(parse_html(&url(), "<html><body></body></html>").is_none());
    }
}
