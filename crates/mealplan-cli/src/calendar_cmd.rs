//! `mealplan show`, `mealplan calendar` and `mealplan toggle` commands.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};

use mealplan_core::completion::toggle_meal;
use mealplan_core::{CalendarIndex, MealType, PersistenceGateway, RetryPolicy};

use crate::display;

/// Days shown by `calendar` when `--to` is omitted.
const DEFAULT_SPAN_DAYS: u64 = 30;

/// Print the stored plan for one date.
pub async fn run_show(gateway: &dyn PersistenceGateway, date: NaiveDate) -> Result<()> {
    let day = gateway
        .get_day_plan(date)
        .await
        .with_context(|| format!("failed to load day plan for {date}"))?;

    match day {
        Some(day) => print!("{}", display::format_day(&day)),
        None => println!("No meal plan stored for {date}."),
    }
    Ok(())
}

/// Print one line per stored day in `from..=to`.
pub async fn run_calendar(
    gateway: &dyn PersistenceGateway,
    from: NaiveDate,
    to: Option<NaiveDate>,
) -> Result<()> {
    let to = match to {
        Some(to) => to,
        None => from
            .checked_add_days(Days::new(DEFAULT_SPAN_DAYS))
            .unwrap_or(NaiveDate::MAX),
    };

    let index = CalendarIndex::new();
    index
        .hydrate(gateway, from, to)
        .await
        .context("failed to load calendar")?;

    let days = index.range(from, to).await;
    if days.is_empty() {
        println!("No meal plans between {from} and {to}.");
        return Ok(());
    }
    for day in &days {
        let labels = index.summary(day.date).await;
        println!("{}", display::format_calendar_line(day, &labels));
    }
    Ok(())
}

/// Flip one meal's completed flag.
pub async fn run_toggle(
    gateway: &dyn PersistenceGateway,
    date: NaiveDate,
    meal: MealType,
    policy: &RetryPolicy,
) -> Result<()> {
    let index = CalendarIndex::new();
    let completion = toggle_meal(gateway, &index, date, meal, policy).await?;
    let state = if completion.get(meal) { "done" } else { "not done" };
    println!("{date} {}: {state}", meal.label());
    Ok(())
}
