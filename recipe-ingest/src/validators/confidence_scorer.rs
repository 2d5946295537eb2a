//! Confidence Scorer
//!
//! Pure function from a recipe record plus its provenance map to a score in
//! [0, 1]. Called after every merge step, so it must stay deterministic and
//! side-effect free.
//!
//! # Scoring Algorithm
//! - **Required fields** (0.70): title 0.20, ingredients 0.25, instructions 0.25
//! - **Optional fields** (0.30): image 0.10, total_time 0.05, yields 0.05,
//!   nutrients 0.05, cuisine 0.025, category 0.025
//!
//! Each present field contributes `weight × source multiplier`, where the
//! multiplier depends on the field's provenance tag. Absent fields contribute
//! nothing. The sum is rounded to two decimals.
//!
//! # Thresholds
//! - High: score ≥ 0.8 stops the cascade after S1 or S2
//! - Medium: score ≥ 0.6 stops the cascade after S3
//! - Low: score < 0.4 triggers the model fallback and the low-confidence warning

use crate::types::{Field, ProvenanceMap, RecipeRecord, SourceTag};

pub const HIGH_CONFIDENCE: f64 = 0.8;
pub const MEDIUM_CONFIDENCE: f64 = 0.6;
pub const LOW_CONFIDENCE: f64 = 0.4;

/// Field weights (sum 1.0)
pub const FIELD_WEIGHTS: [(Field, f64); 9] = [
    (Field::Title, 0.20),
    (Field::Ingredients, 0.25),
    (Field::Instructions, 0.25),
    (Field::Image, 0.10),
    (Field::TotalTime, 0.05),
    (Field::Yields, 0.05),
    (Field::Cuisine, 0.025),
    (Field::Category, 0.025),
    (Field::Nutrients, 0.05),
];

// Relative reliability of each source. The schema.org / json-ld split reads
// the same markup in many cases; treat these values as tunable.
pub const SCHEMA_ORG_MULTIPLIER: f64 = 1.0;
pub const JSON_LD_MULTIPLIER: f64 = 0.9;
pub const WILD_MODE_MULTIPLIER: f64 = 0.7;
pub const LLM_MULTIPLIER: f64 = 0.5;
/// Tags this build does not know, and present fields with no tag at all
pub const UNKNOWN_SOURCE_MULTIPLIER: f64 = 0.5;

/// Quality multiplier for a provenance tag
pub fn source_multiplier(tag: Option<SourceTag>) -> f64 {
    match tag {
        Some(SourceTag::SchemaOrg) => SCHEMA_ORG_MULTIPLIER,
        Some(SourceTag::JsonLd) => JSON_LD_MULTIPLIER,
        Some(SourceTag::WildMode) => WILD_MODE_MULTIPLIER,
        Some(SourceTag::Llm) => LLM_MULTIPLIER,
        Some(SourceTag::NotFound) | Some(SourceTag::Error) => 0.0,
        Some(SourceTag::Unrecognized) | None => UNKNOWN_SOURCE_MULTIPLIER,
    }
}

/// Confidence score of `record` given where each field came from
pub fn score(record: &RecipeRecord, provenance: &ProvenanceMap) -> f64 {
    let raw: f64 = FIELD_WEIGHTS
        .iter()
        .filter(|(field, _)| record.has_field(*field))
        .map(|(field, weight)| weight * source_multiplier(provenance.get(field).copied()))
        .sum();

    round2(raw.clamp(0.0, 1.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cuisine, Nutrients};

    fn tagged(record: &RecipeRecord, tag: SourceTag) -> ProvenanceMap {
        record.present_fields().into_iter().map(|f| (f, tag)).collect()
    }

    fn required_only() -> RecipeRecord {
        RecipeRecord {
            title: Some("Guacamole".to_string()),
            ingredients: vec!["3 avocados".to_string(), "1 lime".to_string()],
            instructions: vec!["Mash.".to_string()],
            ..Default::default()
        }
    }

    fn complete() -> RecipeRecord {
        let mut nutrients = Nutrients::new();
        nutrients.insert("calories".to_string(), "250 kcal".to_string());
        RecipeRecord {
            total_time: Some(15),
            yields: Some("4 servings".to_string()),
            image: Some("https://example.com/g.jpg".to_string()),
            nutrients,
            cuisine: Some(Cuisine::One("Mexican".to_string())),
            category: Some("Dip".to_string()),
            ..required_only()
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = FIELD_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_required_fields_from_schema_org() {
        let record = required_only();
        assert_eq!(score(&record, &tagged(&record, SourceTag::SchemaOrg)), 0.70);
    }

    #[test]
    fn test_complete_record_per_source() {
        let record = complete();
        assert_eq!(score(&record, &tagged(&record, SourceTag::SchemaOrg)), 1.0);
        assert_eq!(score(&record, &tagged(&record, SourceTag::JsonLd)), 0.9);
        assert_eq!(score(&record, &tagged(&record, SourceTag::WildMode)), 0.7);
        assert_eq!(score(&record, &tagged(&record, SourceTag::Llm)), 0.5);
    }

    #[test]
    fn test_not_found_and_error_contribute_nothing() {
        let record = required_only();
        let mut provenance = tagged(&record, SourceTag::SchemaOrg);
        provenance.insert(Field::Title, SourceTag::Error);
        provenance.insert(Field::Ingredients, SourceTag::NotFound);
        assert_eq!(score(&record, &provenance), 0.25);
    }

    #[test]
    fn test_unknown_and_missing_tags_are_conservative() {
        let record = required_only();
        let mut provenance = ProvenanceMap::new();
        provenance.insert(Field::Title, SourceTag::Unrecognized);
        // ingredients and instructions untagged
        assert_eq!(score(&record, &provenance), 0.35);
    }

    #[test]
    fn test_blank_instructions_are_absent() {
        let mut record = required_only();
        record.instructions = vec!["   ".to_string()];
        let provenance = tagged(&required_only(), SourceTag::SchemaOrg);
        assert_eq!(score(&record, &provenance), 0.45);
    }

    #[test]
    fn test_mixed_sources_round_to_two_decimals() {
        let record = complete();
        let mut provenance = tagged(&record, SourceTag::SchemaOrg);
        provenance.insert(Field::Cuisine, SourceTag::WildMode);
        provenance.insert(Field::Category, SourceTag::Llm);
        // 0.95 + 0.0175 + 0.0125
        let s = score(&record, &provenance);
        assert_eq!(s, 0.98);
        assert_eq!(s, score(&record, &provenance));
    }

    #[test]
    fn test_score_is_bounded() {
        let empty = RecipeRecord::default();
        assert_eq!(score(&empty, &ProvenanceMap::new()), 0.0);
        let record = complete();
        let s = score(&record, &tagged(&record, SourceTag::SchemaOrg));
        assert!((0.0..=1.0).contains(&s));
    }
}
