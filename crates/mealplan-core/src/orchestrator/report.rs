//! Values returned by a successful orchestrator run.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::DayPlan;
use crate::validator::ParseAmbiguity;

/// Step of the per-batch state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    Idle,
    BuildingPrompt,
    AwaitingGeneration,
    Parsing,
    Validating,
    Persisting,
    NextBatch,
    Done,
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::BuildingPrompt => "building_prompt",
            Self::AwaitingGeneration => "awaiting_generation",
            Self::Parsing => "parsing",
            Self::Validating => "validating",
            Self::Persisting => "persisting",
            Self::NextBatch => "next_batch",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// A validated day the gateway refused after every retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceWarning {
    pub date: NaiveDate,
    pub attempts: u32,
    pub message: String,
}

/// What happened to one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub index: u32,
    /// Days this batch asked for.
    pub requested: u32,
    /// Day markers counted in the raw response.
    pub markers_found: usize,
    /// Days that passed validation.
    pub accepted: usize,
    /// Days that passed validation and were stored.
    pub committed: usize,
    /// Days rejected by validation.
    pub dropped: Vec<ParseAmbiguity>,
    /// Phases entered, in order.
    pub phases: Vec<BatchPhase>,
}

impl BatchReport {
    pub(crate) fn new(index: u32, requested: u32) -> Self {
        Self {
            index,
            requested,
            markers_found: 0,
            accepted: 0,
            committed: 0,
            dropped: Vec::new(),
            phases: Vec::new(),
        }
    }
}

/// Result of a request whose every day was stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Stored days, in date order.
    pub days: Vec<DayPlan>,
    pub batches: Vec<BatchReport>,
}

impl PlanOutcome {
    pub fn committed(&self) -> usize {
        self.days.len()
    }
}
