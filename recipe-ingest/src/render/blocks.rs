//! Content blocks
//!
//! Layout: a two-column row (ingredients left; yield and nutrition right), a
//! divider, numbered instructions, then a collapsible extraction report.

use super::labels::NUTRITION_LABELS;
use crate::extractors::schema::nutrient_key;
use crate::types::{ExtractionResult, Nutrients, StageOutcome};
use serde_json::{json, Value};

/// Notion caps a single text object at 2000 characters
pub const MAX_TEXT_CHARS: usize = 2000;

/// Notion caps any nested `children` array at 100 blocks
pub const MAX_NESTED_CHILDREN: usize = 100;

/// Rich text array, split into API-sized segments
pub fn rich_text(content: &str) -> Value {
    let chars: Vec<char> = content.chars().collect();
    let segments: Vec<Value> = if chars.is_empty() {
        vec![json!({ "type": "text", "text": { "content": "" } })]
    } else {
        chars
            .chunks(MAX_TEXT_CHARS)
            .map(|chunk| {
                let text: String = chunk.iter().collect();
                json!({ "type": "text", "text": { "content": text } })
            })
            .collect()
    };
    Value::Array(segments)
}

pub fn heading(text: &str) -> Value {
    json!({
        "type": "heading_2",
        "heading_2": { "rich_text": rich_text(text), "color": "default", "is_toggleable": false }
    })
}

pub fn paragraph(text: &str) -> Value {
    json!({ "type": "paragraph", "paragraph": { "rich_text": rich_text(text) } })
}

pub fn callout(text: &str, emoji: &str, color: &str) -> Value {
    json!({
        "type": "callout",
        "callout": { "rich_text": rich_text(text), "color": color, "icon": { "emoji": emoji } }
    })
}

fn to_do(text: &str) -> Value {
    json!({
        "type": "to_do",
        "to_do": { "rich_text": rich_text(text), "checked": false, "color": "default" }
    })
}

fn numbered(text: &str) -> Value {
    json!({
        "type": "numbered_list_item",
        "numbered_list_item": { "rich_text": rich_text(text), "color": "default" }
    })
}

fn bulleted(text: &str) -> Value {
    json!({
        "type": "bulleted_list_item",
        "bulleted_list_item": { "rich_text": rich_text(text) }
    })
}

fn divider() -> Value {
    json!({ "type": "divider", "divider": {} })
}

fn column(children: Vec<Value>) -> Value {
    json!({ "type": "column", "column": { "children": children } })
}

/// Nutrition lines in fixed label order; unknown nutrients are skipped
pub fn nutrition_lines(nutrients: &Nutrients) -> Vec<String> {
    let normalized: Nutrients = nutrients
        .iter()
        .map(|(k, v)| (nutrient_key(k), v.clone()))
        .collect();

    NUTRITION_LABELS
        .iter()
        .filter_map(|(key, label)| {
            normalized
                .get(*key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("{}: {}", label, v.trim()))
        })
        .collect()
}

/// Column row, followed by any ingredients that did not fit in the column
fn recipe_columns(result: &ExtractionResult) -> Vec<Value> {
    let data = &result.data;

    let mut left = vec![heading("Ingredients")];
    let mut overflow: Vec<Value> = data
        .ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(to_do)
        .collect();
    let in_column = overflow.len().min(MAX_NESTED_CHILDREN - left.len());
    left.extend(overflow.drain(..in_column));

    let mut right = Vec::new();
    if let Some(yields) = data.yields.as_deref().filter(|y| !y.trim().is_empty()) {
        right.push(callout(&format!("Yield: {}", yields), "🍳", "blue"));
    }
    let nutrition = nutrition_lines(&data.nutrients);
    if !nutrition.is_empty() {
        right.push(heading("Nutrition"));
        right.push(callout(&nutrition.join("\n"), "🥗", "green"));
    }
    // Columns may not be empty
    if right.is_empty() {
        right.push(paragraph(""));
    }

    let mut blocks = vec![json!({
        "type": "column_list",
        "column_list": { "children": [column(left), column(right)] }
    })];
    // Top-level blocks are appended in batches, so the rest go below the row
    blocks.extend(overflow);
    blocks
}

/// Collapsible report: confidence, warnings, field sources, stage trail
pub fn extraction_report(result: &ExtractionResult) -> Value {
    let mut children = vec![paragraph(&format!(
        "Confidence: {:.0}%",
        result.confidence_score * 100.0
    ))];

    if let Some(warning) = &result.warning {
        children.push(paragraph(&format!("Warning: {}", warning)));
    }
    if let Some(error) = &result.error {
        children.push(paragraph(&format!("Error: {}", error)));
    }
    if !result.missing_required.is_empty() {
        let names: Vec<&str> = result.missing_required.iter().map(|f| f.as_str()).collect();
        children.push(paragraph(&format!("Missing required fields: {}", names.join(", "))));
    }

    children.push(paragraph("Sources:"));
    children.extend(
        result
            .provenance
            .iter()
            .map(|(field, tag)| bulleted(&format!("{}: {}", field, tag))),
    );

    if !result.stages.is_empty() {
        children.push(paragraph("Stages:"));
        children.extend(result.stages.iter().map(|stage| {
            let outcome = match stage.outcome {
                StageOutcome::Produced => "produced data",
                StageOutcome::NoData => "no data",
                StageOutcome::Failed => "failed",
            };
            let mut line = format!("{}: {}", stage.strategy, outcome);
            if let Some(score) = stage.score {
                line.push_str(&format!(" (score {:.2})", score));
            }
            if let Some(message) = &stage.message {
                line.push_str(&format!(" - {}", message));
            }
            bulleted(&line)
        }));
    }

    children.push(paragraph(&format!(
        "Parsed {} (run {})",
        result.parse_timestamp.to_rfc3339(),
        result.run_id
    )));

    json!({
        "type": "toggle",
        "toggle": { "rich_text": rich_text("Extraction report"), "children": children }
    })
}

/// Full block list for a page
pub fn content_blocks(result: &ExtractionResult) -> Vec<Value> {
    if result.is_failure() {
        let message = format!(
            "{}: {}",
            result.error.as_deref().unwrap_or("Extraction failed"),
            result.url
        );
        return vec![callout(&message, "⚠️", "red"), extraction_report(result)];
    }

    let mut blocks = recipe_columns(result);
    blocks.push(divider());

    let steps: Vec<&str> = result
        .data
        .instructions
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !steps.is_empty() {
        blocks.push(heading("Instructions"));
        blocks.extend(steps.into_iter().map(numbered));
    }

    if let Some(warning) = &result.warning {
        blocks.push(callout(warning, "⚠️", "yellow"));
    }
    blocks.push(extraction_report(result));
    blocks
}
