//! Offline strategies
//!
//! `FixtureStrategy` runs the real parsers over canned HTML so the cascade can
//! be exercised end to end without fetching anything.

use async_trait::async_trait;
use recipe_ingest::extractors::{json_ld, structured_scrape, wild_mode};
use recipe_ingest::types::{ExtractionStrategy, StrategyError, StrategyOutput};
use recipe_ingest::workflow::ExtractionOrchestrator;
use reqwest::Url;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type ParseFn = fn(&Url, &str) -> Option<StrategyOutput>;

pub struct FixtureStrategy {
    name: &'static str,
    html: String,
    parse: ParseFn,
}

#[async_trait]
impl ExtractionStrategy for FixtureStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn extract(&self, url: &Url) -> Result<Option<StrategyOutput>, StrategyError> {
        Ok((self.parse)(url, &self.html))
    }
}

/// Strategy with a fixed answer that counts invocations
pub struct CannedStrategy {
    name: &'static str,
    answer: Result<Option<StrategyOutput>, String>,
    calls: AtomicUsize,
}

impl CannedStrategy {
    pub fn returning(name: &'static str, output: StrategyOutput) -> Self {
        Self {
            name,
            answer: Ok(Some(output)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty(name: &'static str) -> Self {
        Self {
            name,
            answer: Ok(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str, message: &str) -> Self {
        Self {
            name,
            answer: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionStrategy for CannedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn extract(&self, _url: &Url) -> Result<Option<StrategyOutput>, StrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(output) => Ok(output.clone()),
            Err(message) => Err(StrategyError::Network(message.clone())),
        }
    }
}

/// S1-S3 over `html` with the production parsers; S4 is `fallback`
pub fn fixture_orchestrator(html: &str, fallback: Arc<CannedStrategy>) -> ExtractionOrchestrator {
    let fixture = |name: &'static str, parse: ParseFn| {
        Arc::new(FixtureStrategy {
            name,
            html: html.to_string(),
            parse,
        }) as Arc<dyn ExtractionStrategy>
    };

    ExtractionOrchestrator::new(
        fixture("structured_scrape", |url, html| {
            Some(structured_scrape::scrape_html(url, html))
        }),
        fixture("json_ld", json_ld::parse_html),
        fixture("wild_mode", wild_mode::parse_html),
        fallback,
    )
}

/// Fixture cascade whose model stage has nothing to add
pub fn offline_orchestrator(html: &str) -> ExtractionOrchestrator {
    fixture_orchestrator(html, Arc::new(CannedStrategy::empty("llm_fallback")))
}
