//! Extraction of per-day meal records from generated text.
//!
//! Canonical grammar:
//!
//! ```text
//! Day 1:
//! Breakfast: Greek yogurt with berries (320 cal, 18g protein)
//! Lunch: Quinoa salad with chickpeas (540 cal, 21g protein)
//! Dinner: Baked salmon, asparagus
//!   and brown rice (610 cal, 38g protein)
//! Day 2:
//! ...
//! ```
//!
//! A day header is a line reading `Day <N>` followed by `:` or the end of the
//! line. Emphasis and heading characters around the header (`**Day 1:**`,
//! `## Day 1`) are tolerated but never required. Text before the first
//! header is discarded.
//!
//! Inside a day, a line opens a meal slot when a meal keyword appears before
//! its first colon. Following lines that are not slot headers continue the
//! open slot's description.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{MealSlot, MealType, Meals};

static DAY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^day\s+(\d+)\s*(?::\s*(.*))?$").expect("valid day header regex")
});

static CALORIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\s*(?:kcal|cal|calories)\b").expect("valid calorie regex")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const MARKUP_CHARS: [char; 4] = ['*', '_', '#', '`'];
const BULLETS: [char; 3] = ['-', '•', '+'];

/// One day's segment of a response, before meal extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySegment<'a> {
    /// Number from the `Day N` header.
    pub day_number: u32,
    /// Lines following the header, up to the next header.
    pub lines: Vec<&'a str>,
}

/// A day extracted from a response, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDay {
    pub day_number: u32,
    pub meals: Meals,
}

/// Parse a header line. Returns the day number and any text after the colon.
fn parse_day_header(line: &str) -> Option<(u32, &str)> {
    let stripped = line.trim().trim_start_matches(['#', '*', '_', ' ']);
    // Emphasis may wrap the number or the colon ("Day 1**:" or "Day 1:**").
    let unwrapped: String = stripped.chars().filter(|c| !matches!(c, '*' | '_')).collect();
    let caps = DAY_HEADER.captures(unwrapped.trim())?;
    let number = caps[1].parse::<u32>().ok()?;

    // Locate the remainder in the original line so the segment can borrow it.
    let rest = match caps.get(2) {
        Some(m) if !m.as_str().trim().is_empty() => stripped
            .split_once(':')
            .map(|(_, after)| after)
            .unwrap_or(""),
        _ => "",
    };
    Some((number, rest))
}

/// Number of day-boundary markers in `text`.
pub fn count_day_markers(text: &str) -> usize {
    text.lines()
        .filter(|line| parse_day_header(line).is_some())
        .count()
}

/// Split a response into day segments in document order.
pub fn split_days(text: &str) -> Vec<DaySegment<'_>> {
    let mut segments: Vec<DaySegment<'_>> = Vec::new();
    for line in text.lines() {
        if let Some((day_number, rest)) = parse_day_header(line) {
            let mut lines = Vec::new();
            if !rest.trim().is_empty() {
                lines.push(rest);
            }
            segments.push(DaySegment { day_number, lines });
        } else if let Some(current) = segments.last_mut() {
            current.lines.push(line);
        }
    }
    segments
}

/// Find the meal a slot-header line opens, if any.
///
/// The keyword must occur before the line's first colon; when several
/// keywords do, the earliest one wins.
fn slot_header(line: &str) -> Option<(MealType, &str)> {
    let (head, payload) = line.split_once(':')?;
    let head_lower = head.to_ascii_lowercase();
    MealType::ALL
        .into_iter()
        .filter_map(|meal| head_lower.find(&meal.to_string()).map(|pos| (pos, meal)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, meal)| (meal, payload))
}

/// Split a slot payload into description and parenthesized annotation.
///
/// The annotation runs from the first `(` to the last `)` after it, or to
/// the end when unclosed. Text after the closing `)` stays in the description.
fn split_payload(payload: &str) -> (String, Option<&str>) {
    let Some(open) = payload.find('(') else {
        return (payload.to_string(), None);
    };
    let before = &payload[..open];
    let inner = &payload[open + 1..];
    match inner.rfind(')') {
        Some(close) => (
            format!("{before} {}", &inner[close + 1..]),
            Some(&inner[..close]),
        ),
        None => (before.to_string(), Some(inner)),
    }
}

fn calories_in(annotation: &str) -> Option<i32> {
    let caps = CALORIES.captures(annotation)?;
    caps[1].replace(',', "").parse::<i32>().ok()
}

/// Strip markup, leading bullets, and repeated whitespace.
pub fn clean_text(text: &str) -> String {
    let without_markup: String = text.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect();
    let without_bullet = without_markup.trim().trim_start_matches(BULLETS);
    WHITESPACE
        .replace_all(without_bullet, " ")
        .trim()
        .to_string()
}

/// Extract the three meal slots from one day segment.
pub fn parse_segment(lines: &[&str]) -> Meals {
    let mut payloads: [String; 3] = Default::default();
    let mut current: Option<MealType> = None;

    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((meal, payload)) = slot_header(line) {
            payloads[meal as usize] = payload.to_string();
            current = Some(meal);
        } else if let Some(meal) = current {
            let joined = &mut payloads[meal as usize];
            joined.push(' ');
            joined.push_str(line.trim_start_matches(BULLETS));
        }
    }

    let mut meals = Meals::default();
    for meal in MealType::ALL {
        let (description, annotation) = split_payload(&payloads[meal as usize]);
        let slot = meals.get_mut(meal);
        slot.description = clean_text(&description);
        if let Some(annotation) = annotation {
            slot.nutrients = clean_text(annotation);
            slot.calories = calories_in(annotation);
        }
    }
    meals
}

/// Parse a whole response into days, in document order.
pub fn parse_response(text: &str) -> Vec<ParsedDay> {
    split_days(text)
        .into_iter()
        .map(|segment| ParsedDay {
            day_number: segment.day_number,
            meals: parse_segment(&segment.lines),
        })
        .collect()
}
