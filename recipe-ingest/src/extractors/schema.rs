//! schema.org Recipe lookup and field normalisation
//!
//! Locates the Recipe node embedded in a page, either as JSON-LD
//! (`<script type="application/ld+json">`, including `@graph` containers and
//! `mainEntity` wrappers) or as microdata (`itemtype=".../Recipe"`), and turns
//! its loosely-typed properties into `RecipeRecord` values.

use super::duration::minutes_from_value;
use crate::types::{Cuisine, Nutrients};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

static JSON_LD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector")
});

static MICRODATA_RECIPE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[itemscope][itemtype*="schema.org/Recipe"]"#).expect("valid selector"));

static ITEMPROP_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[itemprop]").expect("valid selector"));

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid pattern"));

/// Properties that may repeat in microdata and are collected as arrays
const MULTI_VALUED_PROPS: &[&str] = &["recipeIngredient", "ingredients", "recipeInstructions", "step"];

// ============================================================================
// Locating the Recipe node
// ============================================================================

/// Raw text of every JSON-LD block in the document
pub fn json_ld_blocks(document: &Html) -> Vec<String> {
    document
        .select(&JSON_LD_SELECTOR)
        .map(|script| script.text().collect::<String>())
        .collect()
}

/// Whether a node's `@type` names Recipe (string or list, prefixed forms allowed)
pub fn is_recipe_type(node: &Value) -> bool {
    let matches = |t: &str| t == "Recipe" || t.ends_with("/Recipe") || t.ends_with(":Recipe");
    match node.get("@type") {
        Some(Value::String(t)) => matches(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

/// Depth-first search for a Recipe-typed object
pub fn find_recipe_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if is_recipe_type(value) {
                return Some(value);
            }
            ["@graph", "mainEntity", "mainEntityOfPage", "itemListElement"]
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(find_recipe_node)
        }
        Value::Array(items) => items.iter().find_map(find_recipe_node),
        _ => None,
    }
}

/// First Recipe object found in the document's JSON-LD blocks
///
/// Blocks that fail to parse are skipped.
pub fn recipe_from_json_ld(document: &Html) -> Option<Value> {
    json_ld_blocks(document).iter().find_map(|block| {
        match serde_json::from_str::<Value>(block.trim()) {
            Ok(value) => find_recipe_node(&value).cloned(),
            Err(e) => {
                debug!(error = %e, "Skipping unparseable JSON-LD block");
                None
            }
        }
    })
}

/// Recipe object rebuilt from microdata attributes
pub fn recipe_from_microdata(document: &Html) -> Option<Value> {
    let root = document.select(&MICRODATA_RECIPE_SELECTOR).next()?;
    let mut node = microdata_object(root);
    node.insert("@type".to_string(), Value::String("Recipe".to_string()));
    Some(Value::Object(node))
}

fn microdata_object(scope: ElementRef<'_>) -> Map<String, Value> {
    let mut map = Map::new();

    for element in scope.select(&ITEMPROP_SELECTOR) {
        if nearest_scope(element).map(|s| s.id()) != Some(scope.id()) {
            continue;
        }
        let Some(prop) = element.value().attr("itemprop") else {
            continue;
        };

        let value = if element.value().attr("itemscope").is_some() {
            Value::Object(microdata_object(element))
        } else {
            match microdata_value(element) {
                Some(v) => Value::String(v),
                None => continue,
            }
        };

        // itemprop may list several space separated names
        for name in prop.split_whitespace() {
            if MULTI_VALUED_PROPS.contains(&name) {
                match map
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()))
                {
                    Value::Array(items) => items.push(value.clone()),
                    other => *other = Value::Array(vec![other.clone(), value.clone()]),
                }
            } else {
                map.entry(name.to_string()).or_insert_with(|| value.clone());
            }
        }
    }

    map
}

/// Closest ancestor (excluding the element itself) carrying `itemscope`
fn nearest_scope(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().attr("itemscope").is_some())
}

fn microdata_value(element: ElementRef<'_>) -> Option<String> {
    let el = element.value();
    let raw = el
        .attr("content")
        .or_else(|| el.attr("datetime"))
        .or_else(|| match el.name() {
            "img" | "source" => el.attr("src"),
            "a" | "link" => el.attr("href"),
            "meta" => el.attr("content"),
            _ => None,
        })
        .map(str::to_string)
        .unwrap_or_else(|| element.text().collect::<Vec<_>>().join(" "));

    let cleaned = clean_text(&raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

// ============================================================================
// Field normalisation
// ============================================================================

/// Strip markup, decode common entities, collapse whitespace
pub fn clean_text(raw: &str) -> String {
    let without_tags = TAG_PATTERN.replace_all(raw, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// Trim, clean and drop blank entries
pub fn clean_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|s| clean_text(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Scalar text of a value (strings and numbers; first usable list entry)
pub fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => clean_text(s),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => return items.iter().find_map(text_of),
        Value::Object(map) => return map.get("name").or_else(|| map.get("text")).and_then(text_of),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

pub fn title(node: &Value) -> Option<String> {
    node.get("name").or_else(|| node.get("headline")).and_then(text_of)
}

pub fn ingredients(node: &Value) -> Vec<String> {
    let raw = node.get("recipeIngredient").or_else(|| node.get("ingredients"));
    match raw {
        Some(Value::Array(items)) => clean_lines(items.iter().filter_map(text_of)),
        Some(Value::String(s)) => clean_lines(s.lines()),
        _ => Vec::new(),
    }
}

/// Flatten `recipeInstructions` into ordered steps
///
/// Accepts a text blob (split on newlines), a list of strings, `HowToStep`
/// objects (`text`, falling back to `name`), and `HowToSection`s whose
/// `itemListElement` holds further steps.
pub fn instructions(node: &Value) -> Vec<String> {
    let mut steps = Vec::new();
    if let Some(raw) = node.get("recipeInstructions").or_else(|| node.get("step")) {
        flatten_steps(raw, &mut steps);
    }
    clean_lines(steps)
}

fn flatten_steps(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            let lines: Vec<&str> = s.lines().filter(|l| !l.trim().is_empty()).collect();
            if lines.len() > 1 {
                out.extend(lines.into_iter().map(str::to_string));
            } else {
                out.push(s.clone());
            }
        }
        Value::Array(items) => items.iter().for_each(|item| flatten_steps(item, out)),
        Value::Object(map) => {
            if let Some(children) = map.get("itemListElement") {
                flatten_steps(children, out);
            } else if let Some(text) = map.get("text").or_else(|| map.get("name")).and_then(Value::as_str) {
                out.push(text.to_string());
            }
        }
        _ => {}
    }
}

/// `totalTime`, or `prepTime + cookTime` when the total is missing
pub fn total_time(node: &Value) -> Option<u32> {
    if let Some(total) = node.get("totalTime").and_then(minutes_from_value) {
        return Some(total);
    }
    let prep = prep_time(node);
    let cook = node.get("cookTime").and_then(minutes_from_value);
    match (prep, cook) {
        (None, None) => None,
        (p, c) => p.unwrap_or(0).checked_add(c.unwrap_or(0)),
    }
}

pub fn prep_time(node: &Value) -> Option<u32> {
    node.get("prepTime").and_then(minutes_from_value)
}

/// `recipeYield`; bare numbers become "N servings"
pub fn yields(node: &Value) -> Option<String> {
    let text = node.get("recipeYield").or_else(|| node.get("yield")).and_then(text_of)?;
    if text.chars().all(|c| c.is_ascii_digit()) {
        let noun = if text == "1" { "serving" } else { "servings" };
        Some(format!("{} {}", text, noun))
    } else {
        Some(text)
    }
}

/// `image` as a URL string, `ImageObject`, or a list of either
pub fn image(node: &Value) -> Option<String> {
    fn url_of(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Array(items) => items.iter().find_map(url_of),
            Value::Object(map) => map.get("url").or_else(|| map.get("contentUrl")).and_then(url_of),
            _ => None,
        }
    }
    node.get("image").and_then(url_of)
}

/// Nutrient key with the schema.org `Content` suffix removed
pub fn nutrient_key(key: &str) -> String {
    key.strip_suffix("Content").unwrap_or(key).to_string()
}

/// `nutrition` object → nutrient map (`*Content` keys shortened, `@` keys dropped)
pub fn nutrients(node: &Value) -> Nutrients {
    let Some(Value::Object(map)) = node.get("nutrition") else {
        return Nutrients::new();
    };
    map.iter()
        .filter(|(key, _)| !key.starts_with('@'))
        .filter_map(|(key, value)| text_of(value).map(|v| (nutrient_key(key), v)))
        .collect()
}

pub fn cuisine(node: &Value) -> Option<Cuisine> {
    match node.get("recipeCuisine")? {
        Value::Array(items) => {
            let list = clean_lines(items.iter().filter_map(text_of));
            (!list.is_empty()).then_some(Cuisine::Many(list))
        }
        other => text_of(other).map(Cuisine::One),
    }
}

/// `recipeCategory`; lists are joined with ", "
pub fn category(node: &Value) -> Option<String> {
    match node.get("recipeCategory")? {
        Value::Array(items) => {
            let list = clean_lines(items.iter().filter_map(text_of));
            (!list.is_empty()).then(|| list.join(", "))
        }
        other => text_of(other),
    }
}
