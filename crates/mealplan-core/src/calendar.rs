//! In-memory index of committed day plans, keyed by date.
//!
//! The index is a read model: the orchestrator inserts a day only after the
//! gateway accepted it. Cloning a [`CalendarIndex`] shares the same map.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::model::{Completion, DayPlan};
use crate::persistence::{PersistenceError, PersistenceGateway};

#[derive(Debug, Clone, Default)]
pub struct CalendarIndex {
    days: Arc<RwLock<BTreeMap<NaiveDate, DayPlan>>>,
}

impl CalendarIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the whole day for `plan.date`.
    pub async fn insert(&self, plan: DayPlan) {
        self.days.write().await.insert(plan.date, plan);
    }

    pub async fn get(&self, date: NaiveDate) -> Option<DayPlan> {
        self.days.read().await.get(&date).cloned()
    }

    /// Labels of the meals planned for `date`; empty for unknown dates.
    pub async fn summary(&self, date: NaiveDate) -> Vec<&'static str> {
        self.days
            .read()
            .await
            .get(&date)
            .map(DayPlan::filled_labels)
            .unwrap_or_default()
    }

    /// Indexed days with `from <= date <= to`, ascending.
    pub async fn range(&self, from: NaiveDate, to: NaiveDate) -> Vec<DayPlan> {
        if from > to {
            return Vec::new();
        }
        self.days
            .read()
            .await
            .range(from..=to)
            .map(|(_, day)| day.clone())
            .collect()
    }

    /// Replace the completion flags of an indexed day. Returns `false` when
    /// the date is not indexed.
    pub async fn set_completion(&self, date: NaiveDate, completion: Completion) -> bool {
        match self.days.write().await.get_mut(&date) {
            Some(day) => {
                day.completed = completion;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.days.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.days.read().await.is_empty()
    }

    /// Load `from..=to` from `gateway` into the index. Returns the number of
    /// days loaded.
    pub async fn hydrate(
        &self,
        gateway: &dyn PersistenceGateway,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<usize, PersistenceError> {
        let plans = gateway.day_plans_in_range(from, to).await?;
        let count = plans.len();
        let mut days = self.days.write().await;
        for plan in plans {
            days.insert(plan.date, plan);
        }
        tracing::debug!(%from, %to, count, "hydrated calendar index");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MealSlot, Meals};
    use crate::persistence::MemoryGateway;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn slot(text: &str) -> MealSlot {
        MealSlot {
            description: text.to_string(),
            ..MealSlot::default()
        }
    }

    fn full_day(d: u32) -> DayPlan {
        DayPlan::new(
            date(d),
            Meals {
                breakfast: slot("Eggs"),
                lunch: slot("Soup"),
                dinner: slot("Fish"),
            },
            Some(d as i32),
        )
    }

    #[tokio::test]
    async fn summary_lists_filled_meals() {
        let index = CalendarIndex::new();
        index.insert(full_day(1)).await;

        let mut partial = full_day(2);
        partial.meals.lunch = MealSlot::default();
        index.insert(partial).await;

        assert_eq!(index.summary(date(1)).await, vec!["Breakfast", "Lunch", "Dinner"]);
        assert_eq!(index.summary(date(2)).await, vec!["Breakfast", "Dinner"]);
        assert!(index.summary(date(3)).await.is_empty());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let index = CalendarIndex::new();
        let handle = index.clone();
        handle.insert(full_day(5)).await;
        assert_eq!(index.get(date(5)).await.unwrap().day_number, Some(5));
    }

    #[tokio::test]
    async fn range_and_completion() {
        let index = CalendarIndex::new();
        for d in [3, 1, 2] {
            index.insert(full_day(d)).await;
        }
        let dates: Vec<_> = index.range(date(2), date(9)).await.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2), date(3)]);

        let done = Completion {
            breakfast: true,
            ..Completion::default()
        };
        assert!(index.set_completion(date(1), done).await);
        assert!(index.get(date(1)).await.unwrap().completed.breakfast);
        assert!(!index.set_completion(date(20), done).await);
    }

    #[tokio::test]
    async fn hydrate_loads_from_gateway() {
        let gateway = MemoryGateway::new();
        for d in 1..=4 {
            gateway.put_day_plan(&full_day(d)).await.unwrap();
        }
        let index = CalendarIndex::new();
        let loaded = index.hydrate(&gateway, date(2), date(3)).await.unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(index.len().await, 2);
        assert!(index.get(date(1)).await.is_none());
    }
}
