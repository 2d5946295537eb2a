//! Duration parsing
//!
//! Recipe times arrive as ISO-8601 durations (`PT1H30M`) in structured data
//! and as free text ("1 hr 20 mins") on pages without markup. Both are
//! normalised to whole minutes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^P(?:(\d+(?:\.\d+)?)W)?(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("ISO duration pattern is valid")
});

static HUMAN_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(days?|d|hours?|hrs?|h|minutes?|mins?|m)\b")
        .expect("human duration pattern is valid")
});

/// Longest duration accepted, in minutes (one year)
pub const MAX_MINUTES: u32 = 525_600;

/// Round to whole minutes, rejecting negative or implausibly long values
fn whole_minutes(minutes: f64) -> Option<u32> {
    let rounded = minutes.round();
    (rounded >= 0.0 && rounded <= MAX_MINUTES as f64).then(|| rounded as u32)
}

/// Parse an ISO-8601 duration into minutes (seconds rounded)
///
/// Returns `None` for malformed input, a duration without components, or
/// anything longer than [`MAX_MINUTES`].
pub fn parse_iso8601_minutes(text: &str) -> Option<u32> {
    let caps = ISO_DURATION.captures(text.trim())?;

    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
    if (1..=5).all(|i| caps.get(i).is_none()) {
        return None;
    }

    let minutes = part(1).unwrap_or(0.0) * 7.0 * 24.0 * 60.0
        + part(2).unwrap_or(0.0) * 24.0 * 60.0
        + part(3).unwrap_or(0.0) * 60.0
        + part(4).unwrap_or(0.0)
        + part(5).unwrap_or(0.0) / 60.0;

    whole_minutes(minutes)
}

/// Parse free text such as "1 hr 20 mins" or "45 minutes" into minutes
///
/// A bare number is taken as minutes.
pub fn parse_human_minutes(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Ok(n) = text.parse::<f64>() {
        return whole_minutes(n);
    }

    let mut total = 0.0;
    let mut matched = false;
    for caps in HUMAN_DURATION.captures_iter(text) {
        let Ok(amount) = caps[1].parse::<f64>() else {
            continue;
        };
        let unit = caps[2].to_ascii_lowercase();
        total += if unit.starts_with('d') {
            amount * 24.0 * 60.0
        } else if unit.starts_with('h') {
            amount * 60.0
        } else {
            amount
        };
        matched = true;
    }

    if !matched {
        return None;
    }
    whole_minutes(total)
}

/// Minutes from a structured-data value (ISO string, text, or number)
pub fn minutes_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => parse_iso8601_minutes(s).or_else(|| parse_human_minutes(s)),
        Value::Number(n) => n.as_f64().and_then(whole_minutes),
        Value::Array(items) => items.iter().find_map(minutes_from_value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_iso_durations() {
        assert_eq!(parse_iso8601_minutes("PT1H30M"), Some(90));
        assert_eq!(parse_iso8601_minutes("PT45M"), Some(45));
        assert_eq!(parse_iso8601_minutes("pt2h"), Some(120));
        assert_eq!(parse_iso8601_minutes("P1DT2H"), Some(1560));
        assert_eq!(parse_iso8601_minutes("PT90S"), Some(2));
        assert_eq!(parse_iso8601_minutes("PT0.5H"), Some(30));
    }

    #[test]
    fn test_iso_rejects_malformed() {
        assert_eq!(parse_iso8601_minutes("P"), None);
        assert_eq!(parse_iso8601_minutes("PT"), None);
        assert_eq!(parse_iso8601_minutes("1 hour"), None);
        assert_eq!(parse_iso8601_minutes(""), None);
    }

    #[test]
    fn test_human_durations() {
        assert_eq!(parse_human_minutes("1 hr 20 mins"), Some(80));
        assert_eq!(parse_human_minutes("45 minutes"), Some(45));
        assert_eq!(parse_human_minutes("2 hours"), Some(120));
        assert_eq!(parse_human_minutes("30"), Some(30));
        assert_eq!(parse_human_minutes("about an hour"), None);
    }

    #[test]
    fn test_minutes_from_value() {
        assert_eq!(minutes_from_value(&json!("PT25M")), Some(25));
        assert_eq!(minutes_from_value(&json!("25 mins")), Some(25));
        assert_eq!(minutes_from_value(&json!(40)), Some(40));
        assert_eq!(minutes_from_value(&json!(["PT10M"])), Some(10));
        assert_eq!(minutes_from_value(&json!(null)), None);
    }

    #[test]
    fn test_implausible_durations_rejected() {
        assert_eq!(parse_iso8601_minutes("P4000000D"), None);
        assert_eq!(parse_iso8601_minutes("P365D"), Some(MAX_MINUTES));
        assert_eq!(parse_iso8601_minutes("P366D"), None);
        assert_eq!(parse_human_minutes("99999999 days"), None);
        assert_eq!(parse_human_minutes("1e300"), None);
        assert_eq!(minutes_from_value(&json!(1.0e12)), None);
        assert_eq!(minutes_from_value(&json!(-5)), None);
    }
}
