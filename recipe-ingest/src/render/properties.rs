//! Page properties and cover

use super::labels::{category_label, cuisine_label};
use crate::types::ExtractionResult;
use serde_json::{json, Map, Value};

/// Properties object for a page update
///
/// Only fields present in the result are written, so a failed extraction
/// leaves existing properties untouched apart from `Link`.
pub fn page_properties(result: &ExtractionResult) -> Value {
    let data = &result.data;
    let mut props = Map::new();

    if let Some(title) = data.title.as_deref().filter(|t| !t.trim().is_empty()) {
        props.insert("Name".into(), json!({ "title": [{ "text": { "content": title } }] }));
    }
    if let Some(host) = data.host.as_deref().filter(|h| !h.is_empty()) {
        props.insert("Source".into(), json!({ "rich_text": [{ "text": { "content": host } }] }));
    }
    if let Some(url) = data.url.as_deref().filter(|u| !u.is_empty()) {
        props.insert("Link".into(), json!({ "url": url }));
    }
    if let Some(total) = data.total_time {
        props.insert("Cooking Time, total".into(), json!({ "number": total }));
    }
    if let Some(prep) = data.prep_time {
        props.insert("Preparation Time".into(), json!({ "number": prep }));
    }

    if let Some(cuisine) = &data.cuisine {
        let mut tags: Vec<String> = Vec::new();
        for label in cuisine.tags().iter().map(|t| cuisine_label(t)) {
            // multi_select rejects duplicate option names
            if !tags.contains(&label) {
                tags.push(label);
            }
        }
        if !tags.is_empty() {
            let options: Vec<Value> = tags.into_iter().map(|name| json!({ "name": name })).collect();
            props.insert("Tags".into(), json!({ "multi_select": options }));
        }
    }

    if let Some(label) = data.category.as_deref().and_then(category_label) {
        props.insert("Type".into(), json!({ "select": { "name": label } }));
    }

    Value::Object(props)
}

/// External cover image, when the recipe has one
pub fn cover(result: &ExtractionResult) -> Option<Value> {
    let image = result.data.image.as_deref().filter(|i| !i.trim().is_empty())?;
    Some(json!({ "type": "external", "external": { "url": image } }))
}
