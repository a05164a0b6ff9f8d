//! Storage abstraction for day plans and the generation transcript.
//!
//! Two backends: [`memory::MemoryGateway`] and [`postgres::PgGateway`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Completion, DayPlan};

pub use memory::MemoryGateway;
pub use postgres::PgGateway;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("no day plan stored for {0}")]
    NotFound(NaiveDate),

    #[error("storage backend error: {0:#}")]
    Backend(anyhow::Error),
}

impl From<anyhow::Error> for PersistenceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Backend(err)
    }
}

/// One generation call: the user's request and the raw text that came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: Uuid,
    pub request_text: String,
    pub response_text: String,
    pub created_at: DateTime<Utc>,
}

/// Keyed storage for [`DayPlan`]s (one per date) plus an append-only
/// transcript.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Insert or overwrite the plan stored for `plan.date`.
    async fn put_day_plan(&self, plan: &DayPlan) -> Result<(), PersistenceError>;

    /// Replace the completion flags of an existing day.
    ///
    /// Returns [`PersistenceError::NotFound`] when nothing is stored for `date`.
    async fn update_completion(
        &self,
        date: NaiveDate,
        completion: Completion,
    ) -> Result<(), PersistenceError>;

    async fn get_day_plan(&self, date: NaiveDate) -> Result<Option<DayPlan>, PersistenceError>;

    /// Plans with `from <= date <= to`, ascending by date.
    async fn day_plans_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DayPlan>, PersistenceError>;

    async fn append_transcript(&self, request: &str, response: &str)
    -> Result<(), PersistenceError>;

    /// The latest `limit` entries, oldest first.
    async fn transcript(&self, limit: usize) -> Result<Vec<TranscriptEntry>, PersistenceError>;
}
