//! Day-count inference from informal request text.
//!
//! Resolution order (first match wins):
//! 1. an explicit `<N> day(s)` / `<N>-day` phrase
//! 2. text containing "month" anywhere ("bimonthly" too) -> 30
//! 3. text containing "week" anywhere ("weekend" too) -> 7
//! 4. otherwise 1
//!
//! The result is always clamped to `1..=MAX_DAYS`. Before resolving, the
//! request has to look like a dietary request at all; see [`check_domain`].

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Longest plan the pipeline will produce.
pub const MAX_DAYS: u32 = 30;

const MONTH_DAYS: u32 = 30;
const WEEK_DAYS: u32 = 7;

static EXPLICIT_DAYS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*-?\s*days?\b").expect("valid day-count regex")
});

// Substring matches, unlike the whole-word domain keywords below.
static MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)month").expect("valid month regex"));

static WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)week").expect("valid week regex"));

/// Keywords that identify a food request on their own.
static FOOD_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(meals?|diets?|foods?|breakfasts?|lunch(es)?|dinners?|calories?|nutrition(al)?)\b",
    )
    .expect("valid food keyword regex")
});

/// "plan" is in the keyword set but is too generic to stand alone.
static PLAN_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bplans?\b").expect("valid plan keyword regex"));

/// Why a request was refused before any generation happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request is empty")]
    Empty,

    #[error(
        "request does not look like a meal request \
         (mention meals, diet, food, breakfast, lunch, dinner, calories, or nutrition)"
    )]
    NoDomainKeyword,

    #[error("plan starting {start} runs past the last representable date")]
    DateOutOfRange { start: chrono::NaiveDate },
}

/// Reject text that does not mention the food domain.
///
/// A food keyword must appear as a whole word. The bare word "plan" passes
/// only together with a food keyword.
pub fn check_domain(text: &str) -> Result<(), RequestError> {
    if text.trim().is_empty() {
        return Err(RequestError::Empty);
    }
    if FOOD_KEYWORD.is_match(text) {
        return Ok(());
    }
    if PLAN_KEYWORD.is_match(text) {
        tracing::debug!("request mentions a plan but no food keyword");
    }
    Err(RequestError::NoDomainKeyword)
}

/// Infer the number of days a request asks for, in `1..=MAX_DAYS`.
pub fn resolve_duration(text: &str) -> u32 {
    if let Some(caps) = EXPLICIT_DAYS.captures(text) {
        // Digit strings too long for u64 are certainly above the cap.
        let n = caps[1].parse::<u64>().unwrap_or(u64::MAX);
        return n.clamp(1, u64::from(MAX_DAYS)) as u32;
    }
    if MONTH.is_match(text) {
        return MONTH_DAYS;
    }
    if WEEK.is_match(text) {
        return WEEK_DAYS;
    }
    1
}

/// Domain gate followed by duration resolution.
pub fn resolve_request(text: &str) -> Result<u32, RequestError> {
    check_domain(text)?;
    let days = resolve_duration(text);
    tracing::debug!(days, "resolved request duration");
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_day_count() {
        assert_eq!(resolve_duration("Give me a 3 day meal plan"), 3);
        assert_eq!(resolve_duration("a 5-day diet"), 5);
        assert_eq!(resolve_duration("meals for 12 DAYS please"), 12);
        assert_eq!(resolve_duration("2days of food"), 2);
    }

    #[test]
    fn explicit_count_beats_month_and_week() {
        assert_eq!(resolve_duration("a 4 day plan for this month"), 4);
        assert_eq!(resolve_duration("next week, 2 days only"), 2);
    }

    #[test]
    fn month_beats_week() {
        assert_eq!(resolve_duration("a month of meals, week by week"), 30);
    }

    #[test]
    fn week_and_default() {
        assert_eq!(resolve_duration("a weekly meal plan"), 7);
        assert_eq!(resolve_duration("healthy dinner ideas"), 1);
    }

    #[test]
    fn month_and_week_match_inside_words() {
        assert_eq!(resolve_duration("a weekend meal plan"), 7);
        assert_eq!(resolve_duration("WEEKDAY lunches"), 7);
        assert_eq!(resolve_duration("a bimonthly diet"), 30);
        assert_eq!(resolve_duration("Semimonthly food prep"), 30);
    }

    #[test]
    fn explicit_count_is_clamped() {
        assert_eq!(resolve_duration("a 90 day diet"), MAX_DAYS);
        assert_eq!(resolve_duration("0 days of food"), 1);
        assert_eq!(
            resolve_duration("99999999999999999999999 days of meals"),
            MAX_DAYS
        );
    }

    #[test]
    fn every_phrasing_stays_in_range() {
        let samples = [
            "",
            "week",
            "month",
            "1 day",
            "31 days",
            "1000 days",
            "a fortnight",
            "7-day week month",
        ];
        for s in samples {
            let d = resolve_duration(s);
            assert!((1..=MAX_DAYS).contains(&d), "{s:?} -> {d}");
        }
    }

    #[test]
    fn domain_gate_accepts_food_words() {
        assert!(check_domain("Give me a 3 day meal plan").is_ok());
        assert!(check_domain("low carb DIET").is_ok());
        assert!(check_domain("what should I eat for lunch").is_ok());
        assert!(check_domain("2000 calories a day").is_ok());
    }

    #[test]
    fn domain_gate_rejects_bare_plan() {
        assert_eq!(check_domain("plan"), Err(RequestError::NoDomainKeyword));
        assert_eq!(
            check_domain("plan my trip to the planet"),
            Err(RequestError::NoDomainKeyword)
        );
    }

    #[test]
    fn domain_gate_requires_whole_words() {
        assert_eq!(
            check_domain("seafoodish mealtime-less"),
            Err(RequestError::NoDomainKeyword)
        );
    }

    #[test]
    fn domain_gate_rejects_blank() {
        assert_eq!(check_domain("   \n"), Err(RequestError::Empty));
    }

    #[test]
    fn resolve_request_gates_first() {
        assert_eq!(resolve_request("a 3 day meal plan"), Ok(3));
        assert_eq!(
            resolve_request("a 3 day road trip"),
            Err(RequestError::NoDomainKeyword)
        );
    }
}
