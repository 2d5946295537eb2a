//! Webhook adapter
//!
//! Decodes an inbound database automation event into the page to update and
//! the recipe URL to import. Accepts the raw Notion payload or an
//! API-Gateway-style wrapper whose `body` holds the payload as a JSON string
//! or object.

use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

/// Input validation failure (reported as HTTP 400)
#[derive(Debug, Error, PartialEq)]
pub enum WebhookError {
    #[error("Request body is not valid JSON: {0}")]
    InvalidBody(String),

    #[error("Invalid webhook format: no 'data' or 'page' field found")]
    MissingPage,

    #[error("Missing URL in 'Link' property")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to get page ID from event")]
    MissingPageId,
}

/// `Unique ID` property value (e.g. prefix "CB", number 11)
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueId {
    pub prefix: Option<String>,
    pub number: u64,
}

impl std::fmt::Display for UniqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.prefix.as_deref().unwrap_or("CB"), self.number)
    }
}

/// Decoded webhook event
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    /// Page id carried in the payload
    pub page_id: Option<String>,
    pub url: Url,
    pub unique_id: Option<UniqueId>,
}

/// Decode an event payload
pub fn parse_event(payload: &Value) -> Result<WebhookEvent, WebhookError> {
    let unwrapped;
    let body = match payload.get("body") {
        Some(Value::String(raw)) => {
            unwrapped = serde_json::from_str::<Value>(raw)
                .map_err(|e| WebhookError::InvalidBody(e.to_string()))?;
            &unwrapped
        }
        Some(inner @ Value::Object(_)) => inner,
        _ => payload,
    };

    let page = body
        .get("data")
        .or_else(|| body.get("page"))
        .filter(|p| p.is_object())
        .ok_or(WebhookError::MissingPage)?;

    let properties = page.get("properties").unwrap_or(&Value::Null);

    let raw_url = properties
        .get("Link")
        .and_then(link_value)
        .ok_or(WebhookError::MissingUrl)?;
    let url = validate_url(raw_url)?;

    let page_id = page
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let unique_id = properties
        .get("Unique ID")
        .and_then(|p| p.get("unique_id"))
        .and_then(|u| {
            let number = u.get("number").and_then(Value::as_u64)?;
            let prefix = u.get("prefix").and_then(Value::as_str).map(str::to_string);
            Some(UniqueId { prefix, number })
        });

    if page_id.is_none() && unique_id.is_none() {
        return Err(WebhookError::MissingPageId);
    }

    Ok(WebhookEvent {
        page_id,
        url,
        unique_id,
    })
}

/// URL from a `url` property or the first rich-text fragment
fn link_value(link: &Value) -> Option<&str> {
    let direct = link.get("url").and_then(Value::as_str);
    let rich = || {
        let first = link.get("rich_text")?.get(0)?;
        first
            .get("text")
            .and_then(|t| t.get("content"))
            .or_else(|| first.get("plain_text"))
            .and_then(Value::as_str)
    };
    direct
        .or_else(rich)
        .map(str::trim)
        .filter(|u| !u.is_empty())
}

/// Accept only absolute http(s) URLs with a host
pub fn validate_url(raw: &str) -> Result<Url, WebhookError> {
    let url = Url::parse(raw.trim()).map_err(|_| WebhookError::InvalidUrl(raw.to_string()))?;
    let scheme_ok = matches!(url.scheme(), "http" | "https");
    let host_ok = url.host_str().is_some_and(|h| !h.is_empty());
    if scheme_ok && host_ok {
        Ok(url)
    } else {
        Err(WebhookError::InvalidUrl(raw.to_string()))
    }
}
