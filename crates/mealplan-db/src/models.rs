use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// One of the three daily meals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    /// All meal types in day order.
    pub const ALL: [MealType; 3] = [Self::Breakfast, Self::Lunch, Self::Dinner];

    /// Capitalized label used in prompts and calendar summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        };
        f.write_str(s)
    }
}

impl FromStr for MealType {
    type Err = MealTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            _ => Err(MealTypeParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`MealType`] string.
#[derive(Debug, Clone)]
pub struct MealTypeParseError(pub String);

impl fmt::Display for MealTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid meal type: {:?} (expected breakfast, lunch, or dinner)",
            self.0
        )
    }
}

impl std::error::Error for MealTypeParseError {}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A row in the `day_plans` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DayPlanRow {
    pub plan_date: NaiveDate,
    pub day_number: Option<i32>,
    pub breakfast_description: String,
    pub breakfast_nutrients: String,
    pub breakfast_calories: Option<i32>,
    pub lunch_description: String,
    pub lunch_nutrients: String,
    pub lunch_calories: Option<i32>,
    pub dinner_description: String,
    pub dinner_nutrients: String,
    pub dinner_calories: Option<i32>,
    pub breakfast_completed: bool,
    pub lunch_completed: bool,
    pub dinner_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Borrowed view of one meal's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotColumns<'a> {
    pub description: &'a str,
    pub nutrients: &'a str,
    pub calories: Option<i32>,
    pub completed: bool,
}

impl DayPlanRow {
    /// Columns belonging to `meal`.
    pub fn slot(&self, meal: MealType) -> SlotColumns<'_> {
        match meal {
            MealType::Breakfast => SlotColumns {
                description: &self.breakfast_description,
                nutrients: &self.breakfast_nutrients,
                calories: self.breakfast_calories,
                completed: self.breakfast_completed,
            },
            MealType::Lunch => SlotColumns {
                description: &self.lunch_description,
                nutrients: &self.lunch_nutrients,
                calories: self.lunch_calories,
                completed: self.lunch_completed,
            },
            MealType::Dinner => SlotColumns {
                description: &self.dinner_description,
                nutrients: &self.dinner_nutrients,
                calories: self.dinner_calories,
                completed: self.dinner_completed,
            },
        }
    }
}

/// A row in the `transcript_entries` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TranscriptRow {
    pub id: Uuid,
    pub request_text: String,
    pub response_text: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_round_trips_through_display() {
        for meal in MealType::ALL {
            assert_eq!(meal.to_string().parse::<MealType>().unwrap(), meal);
        }
    }

    #[test]
    fn meal_type_parse_is_case_insensitive() {
        assert_eq!("  Dinner ".parse::<MealType>().unwrap(), MealType::Dinner);
        assert_eq!("LUNCH".parse::<MealType>().unwrap(), MealType::Lunch);
    }

    #[test]
    fn meal_type_parse_rejects_unknown() {
        let err = "brunch".parse::<MealType>().unwrap_err();
        assert!(err.to_string().contains("brunch"));
    }

    #[test]
    fn labels_are_capitalized() {
        let labels: Vec<&str> = MealType::ALL.iter().map(|m| m.label()).collect();
        assert_eq!(labels, vec!["Breakfast", "Lunch", "Dinner"]);
    }
}
