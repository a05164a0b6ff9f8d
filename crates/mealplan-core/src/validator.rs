//! Acceptance check between parsing and persistence.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{DayPlan, MealType};
use crate::parser::ParsedDay;

/// A parsed day that could not be accepted because meal slots were empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("day {day_number} is missing {}", format_missing(.missing))]
pub struct ParseAmbiguity {
    pub day_number: u32,
    pub missing: Vec<MealType>,
}

fn format_missing(missing: &[MealType]) -> String {
    missing
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Turn a parsed day into a [`DayPlan`] for `date`, or report which meals
/// are missing.
///
/// `day_number` is the day's position within the whole request, which can
/// differ from the number the generator wrote in its header.
pub fn validate_day(
    parsed: ParsedDay,
    date: NaiveDate,
    day_number: u32,
) -> Result<DayPlan, ParseAmbiguity> {
    let missing = parsed.meals.missing();
    if !missing.is_empty() {
        let err = ParseAmbiguity {
            day_number,
            missing,
        };
        tracing::warn!(%date, day_number, error = %err, "dropping incomplete day");
        return Err(err);
    }

    if parsed.day_number != day_number {
        tracing::debug!(
            written = parsed.day_number,
            expected = day_number,
            "generator numbered day differently"
        );
    }

    Ok(DayPlan::new(date, parsed.meals, i32::try_from(day_number).ok()))
}
