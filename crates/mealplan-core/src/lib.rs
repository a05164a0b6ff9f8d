//! Meal-plan generation and extraction pipeline.
//!
//! ```text
//! request text
//!     |
//!     v
//! duration::resolve_request --> day count (1..=30)
//!     |
//!     v
//! orchestrator::BatchOrchestrator  (one batch of <= 7 days at a time)
//!     |   prompt::build_batch_prompt
//!     |   GenerationClient::generate
//!     |   parser::parse_response
//!     |   validator::validate_day
//!     |   PersistenceGateway::put_day_plan (under a RetryPolicy)
//!     v
//! calendar::CalendarIndex
//! ```

pub mod calendar;
pub mod completion;
pub mod duration;
pub mod generation;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod persistence;
pub mod prompt;
pub mod retry;
pub mod validator;

pub use calendar::CalendarIndex;
pub use generation::{GenerationClient, GenerationError};
pub use model::{
    BatchSpan, Completion, DayPlan, GenerationRequest, MealSlot, MealType, Meals, PlanBatch,
};
pub use orchestrator::{BatchOrchestrator, OrchestratorConfig, PlanError, PlanOutcome};
pub use persistence::{PersistenceError, PersistenceGateway, TranscriptEntry};
pub use retry::RetryPolicy;
