//! Domain types: meal slots, day plans, requests, and batches.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub use mealplan_db::models::MealType;

// ---------------------------------------------------------------------------
// Meals
// ---------------------------------------------------------------------------

/// One meal's free-text content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSlot {
    pub description: String,
    /// Parenthesized annotation from the generated text, e.g. `450 cal, 30g protein`.
    pub nutrients: String,
    pub calories: Option<i32>,
}

impl MealSlot {
    pub fn is_empty(&self) -> bool {
        self.description.trim().is_empty()
    }
}

/// The three slots of a day. Every slot is always present; an unfilled slot
/// has an empty description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meals {
    pub breakfast: MealSlot,
    pub lunch: MealSlot,
    pub dinner: MealSlot,
}

impl Meals {
    pub fn get(&self, meal: MealType) -> &MealSlot {
        match meal {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Dinner => &self.dinner,
        }
    }

    pub fn get_mut(&mut self, meal: MealType) -> &mut MealSlot {
        match meal {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
        }
    }

    /// Meal types whose description is empty, in day order.
    pub fn missing(&self) -> Vec<MealType> {
        MealType::ALL
            .into_iter()
            .filter(|m| self.get(*m).is_empty())
            .collect()
    }
}

/// Per-meal completion flags, toggled by the user after a plan is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub breakfast: bool,
    pub lunch: bool,
    pub dinner: bool,
}

impl Completion {
    pub fn get(&self, meal: MealType) -> bool {
        match meal {
            MealType::Breakfast => self.breakfast,
            MealType::Lunch => self.lunch,
            MealType::Dinner => self.dinner,
        }
    }

    pub fn set(&mut self, meal: MealType, value: bool) {
        match meal {
            MealType::Breakfast => self.breakfast = value,
            MealType::Lunch => self.lunch = value,
            MealType::Dinner => self.dinner = value,
        }
    }

    /// Copy of `self` with `meal` flipped.
    pub fn toggled(mut self, meal: MealType) -> Self {
        self.set(meal, !self.get(meal));
        self
    }
}

// ---------------------------------------------------------------------------
// Day plans
// ---------------------------------------------------------------------------

/// The stored record for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub meals: Meals,
    pub completed: Completion,
    /// 1-based position within the request that produced this day.
    pub day_number: Option<i32>,
}

impl DayPlan {
    pub fn new(date: NaiveDate, meals: Meals, day_number: Option<i32>) -> Self {
        Self {
            date,
            meals,
            completed: Completion::default(),
            day_number,
        }
    }

    /// All three descriptions are non-empty.
    pub fn is_complete(&self) -> bool {
        self.meals.missing().is_empty()
    }

    /// Labels of the meals with content, in day order.
    pub fn filled_labels(&self) -> Vec<&'static str> {
        MealType::ALL
            .into_iter()
            .filter(|m| !self.meals.get(*m).is_empty())
            .map(MealType::label)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Requests and batches
// ---------------------------------------------------------------------------

/// A single user submission after duration resolution. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub raw_text: String,
    pub day_count: u32,
    pub start_date: NaiveDate,
}

impl GenerationRequest {
    /// Split the request into consecutive batches of at most `batch_size` days.
    pub fn batches(&self, batch_size: u32) -> Vec<BatchSpan> {
        let size = batch_size.max(1);
        let mut batches = Vec::new();
        let mut offset = 0;
        while offset < self.day_count {
            let count = size.min(self.day_count - offset);
            batches.push(BatchSpan {
                index: batches.len() as u32,
                first_offset: offset,
                day_count: count,
            });
            offset += count;
        }
        batches
    }

    /// Calendar date of the day at zero-based `offset`.
    pub fn date_at(&self, offset: u32) -> Option<NaiveDate> {
        self.start_date.checked_add_days(Days::new(u64::from(offset)))
    }
}

/// One unit of generation work: a contiguous run of days from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpan {
    /// Zero-based batch index within the request.
    pub index: u32,
    /// Zero-based offset of the first day from the request start.
    pub first_offset: u32,
    pub day_count: u32,
}

impl BatchSpan {
    /// 1-based day numbers covered by this span.
    pub fn day_numbers(&self) -> std::ops::RangeInclusive<u32> {
        (self.first_offset + 1)..=(self.first_offset + self.day_count)
    }
}

/// The validated days produced by one generation call, in date order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanBatch {
    /// Zero-based batch index within the request.
    pub index: u32,
    pub days: Vec<DayPlan>,
}

impl PlanBatch {
    /// Collect the validated days of `span`. Days beyond the span's length
    /// are discarded.
    pub fn new(span: &BatchSpan, mut days: Vec<DayPlan>) -> Self {
        days.truncate(span.day_count as usize);
        days.sort_by_key(|day| day.date);
        Self {
            index: span.index,
            days,
        }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
