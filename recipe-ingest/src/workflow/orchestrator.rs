//! Extraction Orchestrator
//!
//! Runs the four strategies strictly in order, carrying a running best record
//! and its score. Each later stage runs only if the previous score leaves room
//! for improvement:
//!
//! 1. Structured scrape: return at ≥ HIGH, otherwise adopt as best
//! 2. Direct JSON-LD: return at ≥ HIGH, otherwise replace best if it scores higher
//! 3. Wild mode: gap-fill into best (or become best), return at ≥ MEDIUM
//! 4. Model fallback: only below LOW; gap-fill into best
//!
//! The orchestrator never fails. A stage that raises `StrategyError` is logged
//! and treated as having produced no data; when no stage produces anything,
//! an explicit zero-confidence failure record is returned.

use crate::extractors::{
    JsonLdStrategy, LlmFallbackStrategy, StructuredScrapeStrategy, TextModel, WildModeStrategy,
};
use crate::fusion::fill_gaps;
use crate::services::http_fetcher::HttpFetcher;
use crate::types::{
    ExtractionResult, ExtractionStrategy, Field, ProvenanceMap, RecipeRecord, SourceTag,
    StageOutcome, StageReport, StrategyOutput,
};
use crate::validators::{score, HIGH_CONFIDENCE, LOW_CONFIDENCE, MEDIUM_CONFIDENCE};
use chrono::Utc;
use reqwest::Url;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const LOW_CONFIDENCE_WARNING: &str = "Low confidence in extracted data";
pub const ALL_METHODS_FAILED: &str = "All extraction methods failed";

/// Sequential strategy cascade with early exit
pub struct ExtractionOrchestrator {
    structured: Arc<dyn ExtractionStrategy>,
    json_ld: Arc<dyn ExtractionStrategy>,
    wild: Arc<dyn ExtractionStrategy>,
    fallback: Arc<dyn ExtractionStrategy>,
}

/// Running state of one orchestration run
#[derive(Default)]
struct Run {
    best: Option<StrategyOutput>,
    best_score: f64,
    missing_required: Vec<Field>,
    stages: Vec<StageReport>,
}

impl Run {
    fn adopt(&mut self, output: StrategyOutput) {
        self.best_score = score(&output.record, &output.provenance);
        self.best = Some(output);
    }

    fn rescore(&mut self) {
        if let Some(best) = &self.best {
            self.best_score = score(&best.record, &best.provenance);
        }
    }

    fn report(&mut self, strategy: &str, outcome: StageOutcome, message: Option<String>) {
        let score = self.best.as_ref().map(|_| self.best_score);
        self.stages.push(StageReport {
            strategy: strategy.to_string(),
            outcome,
            score,
            message,
        });
    }
}

impl ExtractionOrchestrator {
    pub fn new(
        structured: Arc<dyn ExtractionStrategy>,
        json_ld: Arc<dyn ExtractionStrategy>,
        wild: Arc<dyn ExtractionStrategy>,
        fallback: Arc<dyn ExtractionStrategy>,
    ) -> Self {
        Self {
            structured,
            json_ld,
            wild,
            fallback,
        }
    }

    /// Standard cascade sharing one page fetcher
    pub fn with_fetcher(
        fetcher: Arc<HttpFetcher>,
        model: Option<Arc<dyn TextModel>>,
        max_html_chars: usize,
    ) -> Self {
        Self::new(
            Arc::new(StructuredScrapeStrategy::new(Arc::clone(&fetcher))),
            Arc::new(JsonLdStrategy::new(Arc::clone(&fetcher))),
            Arc::new(WildModeStrategy::new(Arc::clone(&fetcher))),
            Arc::new(LlmFallbackStrategy::new(fetcher, model, max_html_chars)),
        )
    }

    /// Extract a recipe from `url`
    pub async fn extract(&self, url: &Url) -> ExtractionResult {
        let run_id = Uuid::new_v4();
        let span = info_span!("extraction", run_id = %run_id, url = %url);
        self.run_cascade(run_id, url).instrument(span).await
    }

    async fn run_cascade(&self, run_id: Uuid, url: &Url) -> ExtractionResult {
        let mut run = Run::default();

        // Stage 1: structured scrape
        let name = self.structured.name();
        match self.run_stage(self.structured.as_ref(), url, &mut run).await {
            Some(output) => {
                run.missing_required = output.missing_required.clone();
                run.adopt(output);
                run.report(name, StageOutcome::Produced, None);
                if run.best_score >= HIGH_CONFIDENCE {
                    return finish(run_id, url, run);
                }
            }
            None => {
                run.missing_required = Field::REQUIRED.to_vec();
                run.report_no_data(name);
            }
        }

        // Stage 2: direct JSON-LD parse, replaces best only if it scores higher
        let name = self.json_ld.name();
        match self.run_stage(self.json_ld.as_ref(), url, &mut run).await {
            Some(output) => {
                let candidate = score(&output.record, &output.provenance);
                if candidate >= HIGH_CONFIDENCE || run.best.is_none() || candidate > run.best_score {
                    debug!(candidate, previous = run.best_score, "JSON-LD result adopted");
                    run.adopt(output);
                    run.report(name, StageOutcome::Produced, None);
                } else {
                    run.report(
                        name,
                        StageOutcome::Produced,
                        Some(format!("Kept earlier result (scored {:.2})", candidate)),
                    );
                }
                if run.best_score >= HIGH_CONFIDENCE {
                    return finish(run_id, url, run);
                }
            }
            None => run.report_no_data(name),
        }

        // Stage 3: wild mode, gap-filling merge
        let name = self.wild.name();
        match self.run_stage(self.wild.as_ref(), url, &mut run).await {
            Some(output) => {
                let message = merge_or_adopt(&mut run, output, SourceTag::WildMode);
                run.report(name, StageOutcome::Produced, message);
                if run.best_score >= MEDIUM_CONFIDENCE {
                    return finish(run_id, url, run);
                }
            }
            None => run.report_no_data(name),
        }

        // Stage 4: model fallback, only when everything so far scored poorly
        if run.best_score < LOW_CONFIDENCE {
            let name = self.fallback.name();
            match self.run_stage(self.fallback.as_ref(), url, &mut run).await {
                Some(output) => {
                    let message = merge_or_adopt(&mut run, output, SourceTag::Llm);
                    run.report(name, StageOutcome::Produced, message);
                }
                None => run.report_no_data(name),
            }
        }

        finish(run_id, url, run)
    }

    /// Run one strategy; errors and empty results both yield `None`
    async fn run_stage(
        &self,
        strategy: &dyn ExtractionStrategy,
        url: &Url,
        run: &mut Run,
    ) -> Option<StrategyOutput> {
        let name = strategy.name();
        debug!(strategy = name, "Running extraction stage");

        match strategy.extract(url).await {
            Ok(Some(output)) if output.record.has_content() => {
                debug!(
                    strategy = name,
                    fields = output.record.present_fields().len(),
                    "Stage produced data"
                );
                Some(output)
            }
            Ok(_) => {
                debug!(strategy = name, "Stage produced no data");
                None
            }
            Err(e) => {
                warn!(strategy = name, error = %e, "Extraction stage failed, continuing");
                run.report(name, StageOutcome::Failed, Some(e.to_string()));
                None
            }
        }
    }
}

impl Run {
    /// Record a no-data stage unless a failure was already reported for it
    fn report_no_data(&mut self, strategy: &str) {
        let already_failed = self
            .stages
            .last()
            .is_some_and(|s| s.strategy == strategy && s.outcome == StageOutcome::Failed);
        if !already_failed {
            self.report(strategy, StageOutcome::NoData, None);
        }
    }
}

/// Gap-fill `output` into the best record, or adopt it when there is none
fn merge_or_adopt(run: &mut Run, output: StrategyOutput, source: SourceTag) -> Option<String> {
    match run.best.as_mut() {
        Some(best) => {
            let filled = fill_gaps(best, &output, source);
            run.rescore();
            Some(format!("Filled {} field(s)", filled.len()))
        }
        None => {
            run.adopt(output);
            None
        }
    }
}

fn finish(run_id: Uuid, url: &Url, run: Run) -> ExtractionResult {
    let Some(best) = run.best else {
        warn!("No extraction strategy produced data");
        return failure_record(run_id, url, run.stages);
    };

    let warning = (run.best_score < LOW_CONFIDENCE).then(|| LOW_CONFIDENCE_WARNING.to_string());
    info!(
        score = run.best_score,
        stages = run.stages.len(),
        usable = best.record.is_usable(),
        low_confidence = warning.is_some(),
        "Extraction complete"
    );

    ExtractionResult {
        run_id,
        url: url.to_string(),
        data: best.record,
        provenance: best.provenance,
        confidence_score: run.best_score,
        warning,
        error: None,
        missing_required: run.missing_required,
        stages: run.stages,
        parse_timestamp: Utc::now(),
    }
}

/// Zero-confidence record returned when every strategy came up empty
pub fn failure_record(run_id: Uuid, url: &Url, stages: Vec<StageReport>) -> ExtractionResult {
    let mut provenance = ProvenanceMap::new();
    provenance.insert(Field::AllFields, SourceTag::Error);

    ExtractionResult {
        run_id,
        url: url.to_string(),
        data: RecipeRecord {
            url: Some(url.to_string()),
            ..Default::default()
        },
        provenance,
        confidence_score: 0.0,
        warning: None,
        error: Some(ALL_METHODS_FAILED.to_string()),
        missing_required: Field::REQUIRED.to_vec(),
        stages,
        parse_timestamp: Utc::now(),
    }
}
