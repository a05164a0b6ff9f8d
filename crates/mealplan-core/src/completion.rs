//! User-driven completion toggles on stored days.

use chrono::NaiveDate;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::calendar::CalendarIndex;
use crate::model::{Completion, MealType};
use crate::persistence::{PersistenceError, PersistenceGateway};
use crate::retry::{RetryError, RetryPolicy};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no meal plan stored for {0}")]
    UnknownDate(NaiveDate),

    #[error("failed to load day plan for {date}: {source}")]
    Lookup {
        date: NaiveDate,
        #[source]
        source: PersistenceError,
    },

    #[error("failed to update completion for {date}: {source}")]
    Persistence {
        date: NaiveDate,
        #[source]
        source: RetryError<PersistenceError>,
    },
}

/// Flip `meal`'s completed flag for `date` and return the new flags.
///
/// The day is looked up in `index` first and loaded from `gateway` when the
/// index does not hold it. The gateway write runs under `policy`; the index
/// is updated only after the write succeeded.
pub async fn toggle_meal(
    gateway: &dyn PersistenceGateway,
    index: &CalendarIndex,
    date: NaiveDate,
    meal: MealType,
    policy: &RetryPolicy,
) -> Result<Completion, CompletionError> {
    let day = match index.get(date).await {
        Some(day) => day,
        None => gateway
            .get_day_plan(date)
            .await
            .map_err(|source| CompletionError::Lookup { date, source })?
            .ok_or(CompletionError::UnknownDate(date))?,
    };

    let updated = day.completed.toggled(meal);
    let cancel = CancellationToken::new();
    policy
        .run(&cancel, |_| gateway.update_completion(date, updated))
        .await
        .map_err(|err| match err {
            RetryError::Exhausted {
                last: PersistenceError::NotFound(_),
                ..
            } => CompletionError::UnknownDate(date),
            other => CompletionError::Persistence { date, source: other },
        })?;

    if !index.set_completion(date, updated).await {
        let mut day = day;
        day.completed = updated;
        index.insert(day).await;
    }

    tracing::info!(%date, %meal, completed = updated.get(meal), "toggled meal");
    Ok(updated)
}
