//! Model-assisted Fallback (S4)
//!
//! Sends a bounded prefix of the raw HTML to a generative text model and maps
//! its JSON reply onto a recipe record. The call is atomic: any failure is a
//! strategy-level error, never a partial field set.

use super::duration::minutes_from_value;
use super::schema::{clean_lines, clean_text, text_of};
use crate::services::http_fetcher::HttpFetcher;
use crate::types::{ExtractionStrategy, SourceTag, StrategyError, StrategyOutput};
use async_trait::async_trait;
use recipe_common::config::LlmConfig;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You extract recipes from web page HTML. Reply with a single JSON \
object with keys: title (string), ingredients (array of strings), instructions (array of \
strings, one step each), total_time (minutes, number), yields (string). Use null or an empty \
array for anything the page does not contain.";

/// Text generation backend
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Model identifier for logging
    fn model_name(&self) -> &str;

    /// Run one prompt in JSON mode and return the raw reply text
    async fn complete_json(&self, system: &str, user: &str) -> Result<String, StrategyError>;
}

// ============================================================================
// OpenAI-compatible chat completions client
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

pub struct OpenAiChatClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    /// Build a client when an API key is configured
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, StrategyError> {
        let Some(api_key) = config.api_key.clone().filter(|k| !k.trim().is_empty()) else {
            info!("No LLM API key configured, model fallback disabled");
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StrategyError::Model(e.to_string()))?;

        Ok(Some(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
        }))
    }
}

#[async_trait]
impl TextModel for OpenAiChatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete_json(&self, system: &str, user: &str) -> Result<String, StrategyError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StrategyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StrategyError::Model(format!("Model API returned HTTP {}", status)));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| StrategyError::Parse(e.to_string()))?;

        let message = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| StrategyError::Model("No choices in reply".to_string()))?
            .message;

        if let Some(refusal) = message.refusal {
            return Err(StrategyError::Model(format!("Model refused: {}", refusal)));
        }
        message
            .content
            .ok_or_else(|| StrategyError::Model("Empty reply".to_string()))
    }
}

// ============================================================================
// Reply mapping
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelRecipe {
    title: Option<String>,
    ingredients: Vec<Value>,
    instructions: Vec<Value>,
    total_time: Option<Value>,
    yields: Option<Value>,
}

/// Longest prefix of at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Remove a Markdown code fence around the reply, if any
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Map a model reply onto a record tagged `llm`
pub fn parse_reply(reply: &str, url: &Url) -> Result<StrategyOutput, StrategyError> {
    let parsed: ModelRecipe = serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| StrategyError::Parse(format!("Model reply is not recipe JSON: {}", e)))?;

    let mut output = StrategyOutput::default();
    let record = &mut output.record;
    record.title = parsed.title.map(|t| clean_text(&t)).filter(|t| !t.is_empty());
    record.ingredients = clean_lines(parsed.ingredients.iter().filter_map(text_of));
    record.instructions = clean_lines(parsed.instructions.iter().filter_map(text_of));
    record.total_time = parsed.total_time.as_ref().and_then(minutes_from_value);
    record.yields = parsed.yields.as_ref().and_then(text_of);

    for field in output.record.present_fields() {
        output.tag(field, SourceTag::Llm);
    }
    if output.record.has_content() {
        output.stamp_origin(url, SourceTag::Llm);
    }
    Ok(output)
}

/// S4 strategy
pub struct LlmFallbackStrategy {
    fetcher: Arc<HttpFetcher>,
    model: Option<Arc<dyn TextModel>>,
    max_html_chars: usize,
}

impl LlmFallbackStrategy {
    pub fn new(
        fetcher: Arc<HttpFetcher>,
        model: Option<Arc<dyn TextModel>>,
        max_html_chars: usize,
    ) -> Self {
        Self {
            fetcher,
            model,
            max_html_chars,
        }
    }

    /// Model extraction over already-fetched HTML
    pub async fn extract_from_html(
        &self,
        url: &Url,
        html: &str,
    ) -> Result<Option<StrategyOutput>, StrategyError> {
        let model = self.model()?;
        let excerpt = truncate_chars(html, self.max_html_chars);
        let prompt = format!("Page URL: {}\n\nHTML:\n{}", url, excerpt);

        debug!(
            url = %url,
            model = model.model_name(),
            chars = excerpt.chars().count(),
            "Requesting model extraction"
        );

        let reply = model.complete_json(SYSTEM_PROMPT, &prompt).await?;
        let output = parse_reply(&reply, url)?;
        Ok(output.record.has_content().then_some(output))
    }

    fn model(&self) -> Result<&Arc<dyn TextModel>, StrategyError> {
        self.model
            .as_ref()
            .ok_or_else(|| StrategyError::NotAvailable("no model API key configured".to_string()))
    }
}

#[async_trait]
impl ExtractionStrategy for LlmFallbackStrategy {
    fn name(&self) -> &'static str {
        "llm_fallback"
    }

    async fn extract(&self, url: &Url) -> Result<Option<StrategyOutput>, StrategyError> {
        // No fetch without a model
        self.model()?;
        let html = self.fetcher.fetch_html(url).await?;
        self.extract_from_html(url, &html).await
    }
}
