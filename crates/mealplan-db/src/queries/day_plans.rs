//! Database query functions for the `day_plans` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::DayPlanRow;

/// Meal columns for one slot of a [`NewDayPlan`].
#[derive(Debug, Clone, Default)]
pub struct NewSlot<'a> {
    pub description: &'a str,
    pub nutrients: &'a str,
    pub calories: Option<i32>,
}

/// Parameters for writing a day plan row.
#[derive(Debug, Clone)]
pub struct NewDayPlan<'a> {
    pub plan_date: NaiveDate,
    pub day_number: Option<i32>,
    pub breakfast: NewSlot<'a>,
    pub lunch: NewSlot<'a>,
    pub dinner: NewSlot<'a>,
    pub breakfast_completed: bool,
    pub lunch_completed: bool,
    pub dinner_completed: bool,
}

/// Insert a day plan, or overwrite the existing row for the same date.
///
/// Overwriting replaces every meal column, the day number, and the
/// completion flags; `created_at` is preserved.
pub async fn upsert_day_plan(pool: &PgPool, new: &NewDayPlan<'_>) -> Result<DayPlanRow> {
    let row = sqlx::query_as::<_, DayPlanRow>(
        "INSERT INTO day_plans \
         (plan_date, day_number, \
          breakfast_description, breakfast_nutrients, breakfast_calories, \
          lunch_description, lunch_nutrients, lunch_calories, \
          dinner_description, dinner_nutrients, dinner_calories, \
          breakfast_completed, lunch_completed, dinner_completed) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         ON CONFLICT (plan_date) DO UPDATE SET \
          day_number = EXCLUDED.day_number, \
          breakfast_description = EXCLUDED.breakfast_description, \
          breakfast_nutrients = EXCLUDED.breakfast_nutrients, \
          breakfast_calories = EXCLUDED.breakfast_calories, \
          lunch_description = EXCLUDED.lunch_description, \
          lunch_nutrients = EXCLUDED.lunch_nutrients, \
          lunch_calories = EXCLUDED.lunch_calories, \
          dinner_description = EXCLUDED.dinner_description, \
          dinner_nutrients = EXCLUDED.dinner_nutrients, \
          dinner_calories = EXCLUDED.dinner_calories, \
          breakfast_completed = EXCLUDED.breakfast_completed, \
          lunch_completed = EXCLUDED.lunch_completed, \
          dinner_completed = EXCLUDED.dinner_completed, \
          updated_at = now() \
         RETURNING *",
    )
    .bind(new.plan_date)
    .bind(new.day_number)
    .bind(new.breakfast.description)
    .bind(new.breakfast.nutrients)
    .bind(new.breakfast.calories)
    .bind(new.lunch.description)
    .bind(new.lunch.nutrients)
    .bind(new.lunch.calories)
    .bind(new.dinner.description)
    .bind(new.dinner.nutrients)
    .bind(new.dinner.calories)
    .bind(new.breakfast_completed)
    .bind(new.lunch_completed)
    .bind(new.dinner_completed)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert day plan for {}", new.plan_date))?;

    Ok(row)
}

/// Fetch the day plan stored for `date`.
pub async fn get_day_plan(pool: &PgPool, date: NaiveDate) -> Result<Option<DayPlanRow>> {
    let row = sqlx::query_as::<_, DayPlanRow>("SELECT * FROM day_plans WHERE plan_date = $1")
        .bind(date)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch day plan for {date}"))?;

    Ok(row)
}

/// List day plans with `from <= plan_date <= to`, oldest first.
pub async fn list_day_plans_in_range(
    pool: &PgPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DayPlanRow>> {
    let rows = sqlx::query_as::<_, DayPlanRow>(
        "SELECT * FROM day_plans \
         WHERE plan_date BETWEEN $1 AND $2 \
         ORDER BY plan_date",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list day plans from {from} to {to}"))?;

    Ok(rows)
}

/// Overwrite the three completion flags of an existing day.
///
/// Returns the number of rows affected; 0 means no row exists for `date`.
pub async fn update_completion(
    pool: &PgPool,
    date: NaiveDate,
    breakfast: bool,
    lunch: bool,
    dinner: bool,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE day_plans \
         SET breakfast_completed = $2, lunch_completed = $3, dinner_completed = $4, \
             updated_at = now() \
         WHERE plan_date = $1",
    )
    .bind(date)
    .bind(breakfast)
    .bind(lunch)
    .bind(dinner)
    .execute(pool)
    .await
    .with_context(|| format!("failed to update completion for {date}"))?;

    Ok(result.rows_affected())
}

/// Total number of stored days.
pub async fn count_day_plans(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM day_plans")
        .fetch_one(pool)
        .await
        .context("failed to count day plans")?;

    Ok(count)
}
