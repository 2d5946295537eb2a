//! Presentation renderer
//!
//! Turns an `ExtractionResult` into Notion page properties, an optional cover,
//! and the page's content blocks.

pub mod blocks;
pub mod labels;
pub mod properties;

use crate::types::ExtractionResult;
use serde_json::Value;

/// Everything written to the destination page for one result
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub properties: Value,
    pub cover: Option<Value>,
    pub blocks: Vec<Value>,
}

pub fn render(result: &ExtractionResult) -> RenderedPage {
    RenderedPage {
        properties: properties::page_properties(result),
        cover: properties::cover(result),
        blocks: blocks::content_blocks(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cuisine, Field, Nutrients, ProvenanceMap, RecipeRecord, SourceTag};
    use crate::workflow::orchestrator::failure_record;
    use chrono::Utc;
    use reqwest::Url;
    use uuid::Uuid;

    fn result() -> ExtractionResult {
        let mut nutrients = Nutrients::new();
        nutrients.insert("proteinContent".to_string(), "3 g".to_string());
        nutrients.insert("calories".to_string(), "250 kcal".to_string());
        nutrients.insert("transFat".to_string(), "0 g".to_string());

        let data = RecipeRecord {
            title: Some("Guacamole".to_string()),
            ingredients: vec!["3 avocados".to_string(), " ".to_string(), "1 lime".to_string()],
            instructions: vec!["Mash.".to_string(), "Season.".to_string()],
            total_time: Some(10),
            yields: Some("4 servings".to_string()),
            image: Some("https://img.example.com/g.jpg".to_string()),
            host: Some("example.com".to_string()),
            nutrients,
            cuisine: Some(Cuisine::One("mexican, tex-mex".to_string())),
            category: Some("dip, appetizer".to_string()),
            url: Some("https://example.com/guacamole".to_string()),
            ..Default::default()
        };
        let provenance: ProvenanceMap = data
            .present_fields()
            .into_iter()
            .map(|f| (f, SourceTag::SchemaOrg))
            .collect();

        ExtractionResult {
            run_id: Uuid::new_v4(),
            url: "https://example.com/guacamole".to_string(),
            data,
            provenance,
            confidence_score: 1.0,
            warning: None,
            error: None,
            missing_required: Vec::new(),
            stages: Vec::new(),
            parse_timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_properties() {
        let page = render(&result());
        let props = &page.properties;

        assert_eq!(props["Name"]["title"][0]["text"]["content"], "Guacamole");
        assert_eq!(props["Source"]["rich_text"][0]["text"]["content"], "example.com");
        assert_eq!(props["Cooking Time, total"]["number"], 10);
        assert!(props.get("Preparation Time").is_none());
        assert_eq!(props["Tags"]["multi_select"][0]["name"], "🇲🇽 Mexican");
        assert_eq!(props["Tags"]["multi_select"][1]["name"], "🌮 Tex-Mex");
        assert_eq!(props["Type"]["select"]["name"], "🫕 Dip");
        assert_eq!(page.cover.unwrap()["external"]["url"], "https://img.example.com/g.jpg");
    }

    #[test]
    fn test_block_layout() {
        let page = render(&result());
        let blocks = &page.blocks;

        assert_eq!(blocks[0]["type"], "column_list");
        let left = &blocks[0]["column_list"]["children"][0]["column"]["children"];
        assert_eq!(left.as_array().unwrap().len(), 3, "heading plus two non-blank ingredients");
        assert_eq!(left[1]["to_do"]["rich_text"][0]["text"]["content"], "3 avocados");

        let right = &blocks[0]["column_list"]["children"][1]["column"]["children"];
        assert_eq!(right[0]["callout"]["rich_text"][0]["text"]["content"], "Yield: 4 servings");
        assert_eq!(
            right[2]["callout"]["rich_text"][0]["text"]["content"],
            "Calories: 250 kcal\nProtein: 3 g"
        );

        assert_eq!(blocks[1]["type"], "divider");
        assert_eq!(blocks[2]["heading_2"]["rich_text"][0]["text"]["content"], "Instructions");
        assert_eq!(blocks[3]["type"], "numbered_list_item");
        assert_eq!(blocks.last().unwrap()["type"], "toggle");
    }

    #[test]
    fn test_long_ingredient_list_spills_below_columns() {
        let mut long = result();
        long.data.ingredients = (1..=150).map(|i| format!("item {}", i)).collect();
        let page = render(&long);
        let blocks = &page.blocks;

        let left = blocks[0]["column_list"]["children"][0]["column"]["children"]
            .as_array()
            .unwrap();
        assert_eq!(left.len(), blocks::MAX_NESTED_CHILDREN);
        assert_eq!(left[99]["to_do"]["rich_text"][0]["text"]["content"], "item 99");

        // Remaining items follow the row, in order, before the divider
        assert_eq!(blocks[1]["to_do"]["rich_text"][0]["text"]["content"], "item 100");
        assert_eq!(blocks[51]["to_do"]["rich_text"][0]["text"]["content"], "item 150");
        assert_eq!(blocks[52]["type"], "divider");

        let top_level = blocks.iter().filter(|b| b["type"] == "to_do").count();
        assert_eq!(left.len() - 1 + top_level, 150);
    }

    #[test]
    fn test_failure_record_renders_error_callout() {
        let url = Url::parse("https://example.com/broken").unwrap();
        let failure = failure_record(Uuid::new_v4(), &url, Vec::new());
        let page = render(&failure);

        assert_eq!(page.blocks.len(), 2);
        assert_eq!(page.blocks[0]["callout"]["color"], "red");
        assert!(page.properties.get("Name").is_none());
        assert_eq!(page.properties["Link"]["url"], "https://example.com/broken");
        assert!(page.cover.is_none());

        let report = &page.blocks[1]["toggle"]["children"];
        let lines: Vec<&str> = report
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|b| b["paragraph"]["rich_text"][0]["text"]["content"].as_str())
            .collect();
        assert!(lines.contains(&"Confidence: 0%"));
        assert!(lines.contains(&"Error: All extraction methods failed"));
        assert!(lines.iter().any(|l| l.starts_with("Missing required fields")));
        assert!(page.blocks[1]["toggle"]["children"]
            .as_array()
            .unwrap()
            .iter()
            .any(|b| b["bulleted_list_item"]["rich_text"][0]["text"]["content"]
                == format!("{}: {}", Field::AllFields, SourceTag::Error)));
    }

    #[test]
    fn test_long_text_is_split() {
        let text = "a".repeat(4500);
        let rich = blocks::rich_text(&text);
        assert_eq!(rich.as_array().unwrap().len(), 3);
    }
}
