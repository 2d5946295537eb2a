//! Gap-filling merge
//!
//! Combines a later strategy's partial record into the running best record.
//! Only fields that are absent or empty in the destination are written;
//! populated fields and their provenance are never overwritten.

use crate::types::{Field, SourceTag, StrategyOutput};
use tracing::debug;

/// Fill gaps in `best` from `incoming`, tagging filled fields `source`
///
/// Returns the fields that were filled, in field order.
pub fn fill_gaps(best: &mut StrategyOutput, incoming: &StrategyOutput, source: SourceTag) -> Vec<Field> {
    let mut filled = Vec::new();

    for field in Field::ALL {
        if !incoming.record.has_field(field) || best.record.has_field(field) {
            continue;
        }
        best.record.copy_field_from(&incoming.record, field);
        best.tag(field, source);
        filled.push(field);
    }

    if !filled.is_empty() {
        debug!(source = %source, filled = ?filled, "Filled gaps in best record");
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecipeRecord;

    fn output(record: RecipeRecord, tag: SourceTag) -> StrategyOutput {
        let provenance = record.present_fields().into_iter().map(|f| (f, tag)).collect();
        StrategyOutput {
            record,
            provenance,
            missing_required: Vec::new(),
        }
    }

    #[test]
    fn test_never_overwrites_populated_field() {
        let mut best = output(
            RecipeRecord {
                title: Some("A".to_string()),
                ..Default::default()
            },
            SourceTag::SchemaOrg,
        );
        let incoming = output(
            RecipeRecord {
                title: Some("B".to_string()),
                ..Default::default()
            },
            SourceTag::WildMode,
        );

        let filled = fill_gaps(&mut best, &incoming, SourceTag::WildMode);

        assert!(filled.is_empty());
        assert_eq!(best.record.title.as_deref(), Some("A"));
        assert_eq!(best.provenance[&Field::Title], SourceTag::SchemaOrg);
    }

    #[test]
    fn test_fills_absent_and_blank_fields() {
        let mut best = output(
            RecipeRecord {
                title: Some("Soup".to_string()),
                instructions: vec![" ".to_string()],
                ..Default::default()
            },
            SourceTag::SchemaOrg,
        );
        best.provenance.insert(Field::Image, SourceTag::NotFound);

        let incoming = output(
            RecipeRecord {
                instructions: vec!["Simmer.".to_string()],
                image: Some("https://example.com/soup.jpg".to_string()),
                total_time: Some(0),
                ..Default::default()
            },
            SourceTag::JsonLd,
        );

        let filled = fill_gaps(&mut best, &incoming, SourceTag::Llm);

        assert_eq!(filled, vec![Field::Instructions, Field::Image]);
        assert_eq!(best.record.instructions, vec!["Simmer."]);
        assert_eq!(best.provenance[&Field::Image], SourceTag::Llm);
        assert_eq!(best.provenance[&Field::Instructions], SourceTag::Llm);
        assert!(best.record.total_time.is_none());
    }
}
