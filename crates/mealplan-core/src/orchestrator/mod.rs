//! Batch orchestrator: turns one request into stored day plans by running
//! generate → parse → validate → persist over batches of at most seven days.
//!
//! Batches run strictly one after another, as do the per-day writes inside
//! a batch. A day reaches the [`CalendarIndex`] only after the gateway
//! accepted it, so a cancelled or failed run leaves the index holding
//! exactly the committed days.

mod report;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::calendar::CalendarIndex;
use crate::duration::{self, RequestError};
use crate::generation::{GenerationClient, GenerationError};
use crate::model::{BatchSpan, GenerationRequest, PlanBatch};
use crate::parser;
use crate::persistence::PersistenceGateway;
use crate::prompt;
use crate::retry::{RetryError, RetryPolicy};
use crate::validator;

pub use report::{BatchPhase, BatchReport, PersistenceWarning, PlanOutcome};

/// Largest number of days requested from one generation call.
pub const MAX_BATCH_SIZE: u32 = 7;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Days per generation call, clamped to `1..=MAX_BATCH_SIZE`.
    pub batch_size: u32,
    /// Pause between consecutive batches.
    pub inter_batch_delay: Duration,
    /// Retry policy for each day's write.
    pub persist_policy: RetryPolicy,
    /// Upper bound on a single generation call.
    pub generation_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            inter_batch_delay: Duration::from_secs(1),
            persist_policy: RetryPolicy::default(),
            generation_timeout: None,
        }
    }
}

/// Why a request did not produce a full plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: RequestError },

    #[error("generation failed in batch {batch} ({committed} day(s) already stored): {source}")]
    Generation {
        batch: u32,
        committed: usize,
        #[source]
        source: GenerationError,
    },

    #[error(
        "batch {batch} returned {found} day(s), expected {expected} \
         ({committed} day(s) already stored)"
    )]
    IncompleteGeneration {
        batch: u32,
        expected: u32,
        found: usize,
        committed: usize,
    },

    #[error("only {produced} of {requested} day(s) were stored")]
    IncompleteMealPlan {
        produced: usize,
        requested: u32,
        /// Days that validated but could not be written.
        warnings: Vec<PersistenceWarning>,
    },

    #[error("cancelled after storing {committed} day(s)")]
    Cancelled { committed: usize },
}

impl PlanError {
    /// Days stored before the run stopped, where known.
    pub fn committed(&self) -> Option<usize> {
        match self {
            Self::Generation { committed, .. }
            | Self::IncompleteGeneration { committed, .. }
            | Self::Cancelled { committed } => Some(*committed),
            Self::IncompleteMealPlan { produced, .. } => Some(*produced),
            Self::InvalidRequest { .. } => None,
        }
    }
}

impl From<RequestError> for PlanError {
    fn from(reason: RequestError) -> Self {
        Self::InvalidRequest { reason }
    }
}

/// Running totals for one request.
#[derive(Default)]
struct RunState {
    outcome: PlanOutcome,
    warnings: Vec<PersistenceWarning>,
}

impl RunState {
    fn committed(&self) -> usize {
        self.outcome.days.len()
    }
}

/// Drives a request through generation, extraction, and storage.
pub struct BatchOrchestrator {
    generator: Arc<dyn GenerationClient>,
    gateway: Arc<dyn PersistenceGateway>,
    index: CalendarIndex,
    config: OrchestratorConfig,
}

impl BatchOrchestrator {
    pub fn new(
        generator: Arc<dyn GenerationClient>,
        gateway: Arc<dyn PersistenceGateway>,
        index: CalendarIndex,
        mut config: OrchestratorConfig,
    ) -> Self {
        let clamped = config.batch_size.clamp(1, MAX_BATCH_SIZE);
        if clamped != config.batch_size {
            tracing::warn!(
                requested = config.batch_size,
                used = clamped,
                "batch size out of range, clamping"
            );
            config.batch_size = clamped;
        }
        Self {
            generator,
            gateway,
            index,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn index(&self) -> &CalendarIndex {
        &self.index
    }

    /// Resolve `raw_text` into a request starting at `start_date` and run it.
    pub async fn run(
        &self,
        raw_text: &str,
        start_date: NaiveDate,
        cancel: CancellationToken,
    ) -> Result<PlanOutcome, PlanError> {
        let day_count = duration::resolve_request(raw_text)?;
        let request = GenerationRequest {
            raw_text: raw_text.to_string(),
            day_count,
            start_date,
        };
        self.run_request(&request, cancel).await
    }

    /// Run an already-resolved request.
    pub async fn run_request(
        &self,
        request: &GenerationRequest,
        cancel: CancellationToken,
    ) -> Result<PlanOutcome, PlanError> {
        if request.date_at(request.day_count.saturating_sub(1)).is_none() {
            return Err(RequestError::DateOutOfRange {
                start: request.start_date,
            }
            .into());
        }

        let batches = request.batches(self.config.batch_size);
        tracing::info!(
            days = request.day_count,
            batches = batches.len(),
            start = %request.start_date,
            "starting meal plan"
        );

        let mut state = RunState::default();
        for (i, batch) in batches.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PlanError::Cancelled {
                    committed: state.committed(),
                });
            }

            let is_last = i + 1 == batches.len();
            let mut report = self.run_batch(request, batch, &mut state, &cancel).await?;

            if is_last {
                enter(&mut report, BatchPhase::Done);
                state.outcome.batches.push(report);
                break;
            }

            enter(&mut report, BatchPhase::NextBatch);
            state.outcome.batches.push(report);
            tokio::select! {
                _ = tokio::time::sleep(self.config.inter_batch_delay) => {}
                _ = cancel.cancelled() => {
                    tracing::info!(committed = state.committed(), "cancelled between batches");
                    return Err(PlanError::Cancelled {
                        committed: state.committed(),
                    });
                }
            }
        }

        let requested = request.day_count;
        if state.committed() != requested as usize {
            tracing::warn!(
                produced = state.committed(),
                requested,
                unsaved = state.warnings.len(),
                "meal plan incomplete"
            );
            return Err(PlanError::IncompleteMealPlan {
                produced: state.committed(),
                requested,
                warnings: state.warnings,
            });
        }

        tracing::info!(committed = state.committed(), "meal plan complete");
        Ok(state.outcome)
    }

    async fn run_batch(
        &self,
        request: &GenerationRequest,
        batch: &BatchSpan,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, PlanError> {
        let mut report = BatchReport::new(batch.index, batch.day_count);
        tracing::info!(
            batch = batch.index,
            first_day = batch.first_offset + 1,
            days = batch.day_count,
            "starting batch"
        );

        enter(&mut report, BatchPhase::BuildingPrompt);
        let prompt = prompt::build_batch_prompt(request, batch);

        enter(&mut report, BatchPhase::AwaitingGeneration);
        let generated = tokio::select! {
            result = self.generate(&prompt) => result,
            _ = cancel.cancelled() => {
                tracing::info!(batch = batch.index, "cancelled during generation");
                return Err(PlanError::Cancelled {
                    committed: state.committed(),
                });
            }
        };
        let text = generated.map_err(|source| {
            tracing::error!(
                batch = batch.index,
                retryable = source.is_retryable(),
                error = %source,
                "generation failed"
            );
            PlanError::Generation {
                batch: batch.index,
                committed: state.committed(),
                source,
            }
        })?;

        if let Err(err) = self.gateway.append_transcript(&request.raw_text, &text).await {
            tracing::warn!(batch = batch.index, error = %err, "failed to record transcript");
        }

        enter(&mut report, BatchPhase::Parsing);
        report.markers_found = parser::count_day_markers(&text);
        if report.markers_found < batch.day_count as usize {
            tracing::warn!(
                batch = batch.index,
                expected = batch.day_count,
                found = report.markers_found,
                "generation returned too few days"
            );
            return Err(PlanError::IncompleteGeneration {
                batch: batch.index,
                expected: batch.day_count,
                found: report.markers_found,
                committed: state.committed(),
            });
        }

        let mut parsed = parser::parse_response(&text);
        if parsed.len() > batch.day_count as usize {
            tracing::debug!(
                batch = batch.index,
                surplus = parsed.len() - batch.day_count as usize,
                "ignoring surplus days"
            );
            parsed.truncate(batch.day_count as usize);
        }

        enter(&mut report, BatchPhase::Validating);
        let mut valid = Vec::with_capacity(parsed.len());
        for (k, day) in parsed.into_iter().enumerate() {
            let offset = batch.first_offset + k as u32;
            let Some(date) = request.date_at(offset) else {
                continue;
            };
            match validator::validate_day(day, date, offset + 1) {
                Ok(plan) => valid.push(plan),
                Err(ambiguity) => report.dropped.push(ambiguity),
            }
        }
        let accepted = PlanBatch::new(batch, valid);
        report.accepted = accepted.len();

        enter(&mut report, BatchPhase::Persisting);
        for plan in accepted.days {
            let attempt = self
                .config
                .persist_policy
                .run(cancel, |_| self.gateway.put_day_plan(&plan))
                .await;
            match attempt {
                Ok(()) => {
                    tracing::debug!(date = %plan.date, "stored day");
                    self.index.insert(plan.clone()).await;
                    state.outcome.days.push(plan);
                    report.committed += 1;
                }
                Err(RetryError::Exhausted { attempts, last }) => {
                    tracing::warn!(
                        date = %plan.date,
                        attempts,
                        error = %last,
                        "giving up on storing day"
                    );
                    state.warnings.push(PersistenceWarning {
                        date: plan.date,
                        attempts,
                        message: last.to_string(),
                    });
                }
                Err(RetryError::Cancelled { .. }) => {
                    return Err(PlanError::Cancelled {
                        committed: state.committed(),
                    });
                }
            }
        }

        tracing::info!(
            batch = batch.index,
            accepted = report.accepted,
            dropped = report.dropped.len(),
            committed = report.committed,
            "finished batch"
        );
        Ok(report)
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self.config.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, self.generator.generate(prompt))
                .await
                .unwrap_or(Err(GenerationError::Timeout(limit))),
            None => self.generator.generate(prompt).await,
        }
    }
}

fn enter(report: &mut BatchReport, phase: BatchPhase) {
    tracing::debug!(batch = report.index, %phase, "batch phase");
    report.phases.push(phase);
}
