//! Plain-text rendering shared by the commands.

use mealplan_core::orchestrator::PersistenceWarning;
use mealplan_core::{DayPlan, MealType, TranscriptEntry};

fn checkbox(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}

/// Multi-line rendering of one day.
pub fn format_day(day: &DayPlan) -> String {
    let mut out = format!("{} ({})", day.date.format("%Y-%m-%d"), day.date.format("%A"));
    if let Some(n) = day.day_number {
        out.push_str(&format!("  day {n}"));
    }
    out.push('\n');
    for meal in MealType::ALL {
        let slot = day.meals.get(meal);
        out.push_str(&format!(
            "  {} {:<9} {}",
            checkbox(day.completed.get(meal)),
            meal.label(),
            slot.description
        ));
        if !slot.nutrients.is_empty() {
            out.push_str(&format!(" ({})", slot.nutrients));
        }
        out.push('\n');
    }
    out
}

/// One-line calendar entry: date, weekday, and the planned meal labels.
pub fn format_calendar_line(day: &DayPlan, labels: &[&str]) -> String {
    let done = MealType::ALL
        .into_iter()
        .filter(|m| day.completed.get(*m))
        .count();
    format!(
        "{} {}  {:<24} {done}/3 done",
        day.date.format("%Y-%m-%d"),
        day.date.format("%a"),
        labels.join(", ")
    )
}

pub fn format_warning(warning: &PersistenceWarning) -> String {
    format!(
        "  {} not saved after {} attempt(s): {}",
        warning.date, warning.attempts, warning.message
    )
}

pub fn format_transcript_entry(entry: &TranscriptEntry) -> String {
    format!(
        "--- {} ---\n> {}\n{}\n",
        entry.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        entry.request_text,
        entry.response_text.trim_end()
    )
}
