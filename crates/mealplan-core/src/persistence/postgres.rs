//! PostgreSQL storage backend over `mealplan_db::queries`.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use mealplan_db::models::{DayPlanRow, TranscriptRow};
use mealplan_db::queries::day_plans::{self, NewDayPlan, NewSlot};
use mealplan_db::queries::transcript;

use super::{PersistenceError, PersistenceGateway, TranscriptEntry};
use crate::model::{Completion, DayPlan, MealSlot, MealType, Meals};

/// Gateway backed by the `day_plans` and `transcript_entries` tables.
#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn new_slot(slot: &MealSlot) -> NewSlot<'_> {
    NewSlot {
        description: &slot.description,
        nutrients: &slot.nutrients,
        calories: slot.calories,
    }
}

fn to_new_day_plan(plan: &DayPlan) -> NewDayPlan<'_> {
    NewDayPlan {
        plan_date: plan.date,
        day_number: plan.day_number,
        breakfast: new_slot(&plan.meals.breakfast),
        lunch: new_slot(&plan.meals.lunch),
        dinner: new_slot(&plan.meals.dinner),
        breakfast_completed: plan.completed.breakfast,
        lunch_completed: plan.completed.lunch,
        dinner_completed: plan.completed.dinner,
    }
}

fn from_row(row: DayPlanRow) -> DayPlan {
    let slot = |meal: MealType| {
        let columns = row.slot(meal);
        MealSlot {
            description: columns.description.to_string(),
            nutrients: columns.nutrients.to_string(),
            calories: columns.calories,
        }
    };
    DayPlan {
        date: row.plan_date,
        meals: Meals {
            breakfast: slot(MealType::Breakfast),
            lunch: slot(MealType::Lunch),
            dinner: slot(MealType::Dinner),
        },
        completed: Completion {
            breakfast: row.breakfast_completed,
            lunch: row.lunch_completed,
            dinner: row.dinner_completed,
        },
        day_number: row.day_number,
    }
}

impl From<TranscriptRow> for TranscriptEntry {
    fn from(row: TranscriptRow) -> Self {
        Self {
            id: row.id,
            request_text: row.request_text,
            response_text: row.response_text,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn put_day_plan(&self, plan: &DayPlan) -> Result<(), PersistenceError> {
        day_plans::upsert_day_plan(&self.pool, &to_new_day_plan(plan)).await?;
        Ok(())
    }

    async fn update_completion(
        &self,
        date: NaiveDate,
        completion: Completion,
    ) -> Result<(), PersistenceError> {
        let rows = day_plans::update_completion(
            &self.pool,
            date,
            completion.breakfast,
            completion.lunch,
            completion.dinner,
        )
        .await?;
        if rows == 0 {
            return Err(PersistenceError::NotFound(date));
        }
        Ok(())
    }

    async fn get_day_plan(&self, date: NaiveDate) -> Result<Option<DayPlan>, PersistenceError> {
        let row = day_plans::get_day_plan(&self.pool, date).await?;
        Ok(row.map(from_row))
    }

    async fn day_plans_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DayPlan>, PersistenceError> {
        let rows = day_plans::list_day_plans_in_range(&self.pool, from, to).await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn append_transcript(
        &self,
        request: &str,
        response: &str,
    ) -> Result<(), PersistenceError> {
        transcript::insert_entry(&self.pool, request, response).await?;
        Ok(())
    }

    async fn transcript(&self, limit: usize) -> Result<Vec<TranscriptEntry>, PersistenceError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = transcript::list_recent(&self.pool, limit).await?;
        Ok(rows.into_iter().map(TranscriptEntry::from).collect())
    }
}
