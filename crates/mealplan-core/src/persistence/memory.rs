//! In-process storage backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PersistenceError, PersistenceGateway, TranscriptEntry};
use crate::model::{Completion, DayPlan};

/// Gateway that keeps everything in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    days: RwLock<BTreeMap<NaiveDate, DayPlan>>,
    transcript: RwLock<Vec<TranscriptEntry>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.days.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.days.read().await.is_empty()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn put_day_plan(&self, plan: &DayPlan) -> Result<(), PersistenceError> {
        self.days.write().await.insert(plan.date, plan.clone());
        Ok(())
    }

    async fn update_completion(
        &self,
        date: NaiveDate,
        completion: Completion,
    ) -> Result<(), PersistenceError> {
        let mut days = self.days.write().await;
        let day = days.get_mut(&date).ok_or(PersistenceError::NotFound(date))?;
        day.completed = completion;
        Ok(())
    }

    async fn get_day_plan(&self, date: NaiveDate) -> Result<Option<DayPlan>, PersistenceError> {
        Ok(self.days.read().await.get(&date).cloned())
    }

    async fn day_plans_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DayPlan>, PersistenceError> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(self
            .days
            .read()
            .await
            .range(from..=to)
            .map(|(_, day)| day.clone())
            .collect())
    }

    async fn append_transcript(
        &self,
        request: &str,
        response: &str,
    ) -> Result<(), PersistenceError> {
        self.transcript.write().await.push(TranscriptEntry {
            id: Uuid::new_v4(),
            request_text: request.to_string(),
            response_text: response.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn transcript(&self, limit: usize) -> Result<Vec<TranscriptEntry>, PersistenceError> {
        let entries = self.transcript.read().await;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries[skip..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MealSlot, Meals};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn plan(d: u32, breakfast: &str) -> DayPlan {
        let meals = Meals {
            breakfast: MealSlot {
                description: breakfast.to_string(),
                ..MealSlot::default()
            },
            ..Meals::default()
        };
        DayPlan::new(date(d), meals, Some(1))
    }

    #[tokio::test]
    async fn put_overwrites_by_date() {
        let gw = MemoryGateway::new();
        gw.put_day_plan(&plan(1, "Eggs")).await.unwrap();
        gw.put_day_plan(&plan(1, "Toast")).await.unwrap();
        assert_eq!(gw.len().await, 1);
        let stored = gw.get_day_plan(date(1)).await.unwrap().unwrap();
        assert_eq!(stored.meals.breakfast.description, "Toast");
    }

    #[tokio::test]
    async fn range_is_inclusive_and_ordered() {
        let gw = MemoryGateway::new();
        for d in [5, 2, 4, 3] {
            gw.put_day_plan(&plan(d, "Eggs")).await.unwrap();
        }
        let dates: Vec<NaiveDate> = gw
            .day_plans_in_range(date(2), date(4))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.date)
            .collect();
        assert_eq!(dates, vec![date(2), date(3), date(4)]);
        assert!(gw.day_plans_in_range(date(4), date(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_completion_requires_existing_day() {
        let gw = MemoryGateway::new();
        let err = gw
            .update_completion(date(9), Completion::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(d) if d == date(9)));

        gw.put_day_plan(&plan(9, "Eggs")).await.unwrap();
        let done = Completion {
            dinner: true,
            ..Completion::default()
        };
        gw.update_completion(date(9), done).await.unwrap();
        assert!(gw.get_day_plan(date(9)).await.unwrap().unwrap().completed.dinner);
    }

    #[tokio::test]
    async fn transcript_keeps_latest_oldest_first() {
        let gw = MemoryGateway::new();
        for i in 0..3 {
            gw.append_transcript(&format!("q{i}"), &format!("a{i}"))
                .await
                .unwrap();
        }
        let entries = gw.transcript(2).await.unwrap();
        let requests: Vec<&str> = entries.iter().map(|e| e.request_text.as_str()).collect();
        assert_eq!(requests, vec!["q1", "q2"]);
        assert_eq!(gw.transcript(10).await.unwrap().len(), 3);
    }
}
