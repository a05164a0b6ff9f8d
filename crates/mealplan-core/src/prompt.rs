//! Generation prompt construction for one batch of days.
//!
//! The prompt is a pure function of the request and the batch, so the same
//! inputs always produce byte-identical text.

use crate::model::{BatchSpan, GenerationRequest};

/// Output contract included in every batch prompt. The parser in
/// [`crate::parser`] is written against exactly this grammar.
const FORMAT_RULES: &str = r#"## Required Format

Write every day in exactly this shape, with nothing between the days:

Day 1:
Breakfast: <meal description> (<calories> cal, <key nutrients>)
Lunch: <meal description> (<calories> cal, <key nutrients>)
Dinner: <meal description> (<calories> cal, <key nutrients>)

Rules:
- Start each day with its own `Day N:` line, using the day numbers listed below.
- Every day has exactly one Breakfast, one Lunch, and one Dinner line.
- Put the calorie and nutrient annotation in parentheses at the end of the meal line.
- Do not use markdown: no bold, no italics, no headings, no bullet points.
- Do not add an introduction, a summary, or notes after the last day.
"#;

const VARIETY_RULES: &str = r#"## Variety

Every meal must be unique across all days. Do not repeat a breakfast, lunch,
or dinner that already appears on another day, including days from earlier
parts of this plan.
"#;

/// Build the generation prompt for `batch` of `request`.
///
/// Days are numbered `batch.first_offset + 1 ..= batch.first_offset +
/// batch.day_count` so a multi-batch plan reads as one continuous sequence.
pub fn build_batch_prompt(request: &GenerationRequest, batch: &BatchSpan) -> String {
    let mut prompt = String::with_capacity(2048);
    let first = batch.first_offset + 1;
    let last = batch.first_offset + batch.day_count;

    prompt.push_str("# Meal Plan Request\n\n");
    prompt.push_str(&format!(
        "You are a nutritionist writing part of a {}-day meal plan. ",
        request.day_count
    ));
    if batch.day_count == 1 {
        prompt.push_str(&format!("Write exactly 1 day: day {first}.\n\n"));
    } else {
        prompt.push_str(&format!(
            "Write exactly {} days: days {first} through {last}.\n\n",
            batch.day_count
        ));
    }

    prompt.push_str(FORMAT_RULES);
    prompt.push('\n');
    prompt.push_str(VARIETY_RULES);
    prompt.push('\n');

    // Schedule lines must not look like day headers, or a model that echoes
    // them produces markers the parser cannot use.
    prompt.push_str("## Days To Write\n\n");
    for day in batch.day_numbers() {
        match request.date_at(day - 1) {
            Some(date) => prompt.push_str(&format!(
                "Day {day} is {} ({}).\n",
                date.format("%Y-%m-%d"),
                date.format("%A")
            )),
            None => prompt.push_str(&format!("Day {day} is the next day.\n")),
        }
    }
    prompt.push('\n');

    prompt.push_str("## User Request\n\n");
    prompt.push_str("Follow the user's preferences below exactly:\n\n");
    prompt.push_str(&request.raw_text);
    prompt.push('\n');

    prompt
}
