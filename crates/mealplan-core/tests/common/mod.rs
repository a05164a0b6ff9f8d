//! Shared stubs for orchestrator integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use mealplan_core::persistence::MemoryGateway;
use mealplan_core::{
    Completion, DayPlan, GenerationClient, GenerationError, PersistenceError, PersistenceGateway,
    TranscriptEntry,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Canonical text for one day.
pub fn canonical_day(n: u32) -> String {
    format!(
        "Day {n}:\n\
         Breakfast: Protein oats {n} (400 cal, 25g protein)\n\
         Lunch: Chicken bowl {n} (550 cal, 40g protein)\n\
         Dinner: Salmon plate {n} (620 cal, 42g protein)\n"
    )
}

/// Canonical text for days `first..=last`.
pub fn canonical_days(first: u32, last: u32) -> String {
    (first..=last).map(canonical_day).collect::<Vec<_>>().join("\n")
}

/// Day numbers listed in a batch prompt's "Days To Write" section.
pub fn requested_days(prompt: &str) -> Vec<u32> {
    prompt
        .lines()
        .filter_map(|line| line.strip_prefix("Day "))
        .filter_map(|rest| {
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            rest[digits.len()..]
                .starts_with(" is ")
                .then(|| digits.parse().ok())
                .flatten()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Returns scripted responses in order and records every prompt.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: Vec<String>) -> Self {
        Self::new(texts.into_iter().map(Ok).collect())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::InvalidResponse("script exhausted".into())))
    }
}

/// Answers every prompt with well-formed text for exactly the days it asks for.
#[derive(Default)]
pub struct EchoGenerator {
    calls: AtomicUsize,
}

impl EchoGenerator {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = requested_days(prompt)
            .into_iter()
            .map(canonical_day)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text)
    }
}

/// Answers the first `answered` prompts like [`EchoGenerator`], then never
/// returns.
pub struct StallingGenerator {
    answered: usize,
    calls: AtomicUsize,
}

impl StallingGenerator {
    pub fn new(answered: usize) -> Self {
        Self {
            answered,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for StallingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.answered {
            std::future::pending::<()>().await;
        }
        Ok(requested_days(prompt)
            .into_iter()
            .map(canonical_day)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

// ---------------------------------------------------------------------------
// Gateways
// ---------------------------------------------------------------------------

/// Memory gateway whose writes fail a configured number of times per date.
#[derive(Default)]
pub struct FlakyGateway {
    inner: MemoryGateway,
    failures: Mutex<HashMap<NaiveDate, u32>>,
    attempts: Mutex<HashMap<NaiveDate, u32>>,
}

impl FlakyGateway {
    /// Fail the next `times` writes for `date`. `u32::MAX` fails forever.
    pub fn fail(self, date: NaiveDate, times: u32) -> Self {
        self.failures.lock().unwrap().insert(date, times);
        self
    }

    pub fn attempts(&self, date: NaiveDate) -> u32 {
        self.attempts.lock().unwrap().get(&date).copied().unwrap_or(0)
    }

    pub fn inner(&self) -> &MemoryGateway {
        &self.inner
    }
}

#[async_trait]
impl PersistenceGateway for FlakyGateway {
    async fn put_day_plan(&self, plan: &DayPlan) -> Result<(), PersistenceError> {
        *self.attempts.lock().unwrap().entry(plan.date).or_default() += 1;
        let should_fail = {
            let mut failures = self.failures.lock().unwrap();
            match failures.get_mut(&plan.date) {
                Some(0) | None => false,
                Some(remaining) => {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    true
                }
            }
        };
        if should_fail {
            return Err(anyhow::anyhow!("simulated outage for {}", plan.date).into());
        }
        self.inner.put_day_plan(plan).await
    }

    async fn update_completion(
        &self,
        date: NaiveDate,
        completion: Completion,
    ) -> Result<(), PersistenceError> {
        self.inner.update_completion(date, completion).await
    }

    async fn get_day_plan(&self, date: NaiveDate) -> Result<Option<DayPlan>, PersistenceError> {
        self.inner.get_day_plan(date).await
    }

    async fn day_plans_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DayPlan>, PersistenceError> {
        self.inner.day_plans_in_range(from, to).await
    }

    async fn append_transcript(
        &self,
        request: &str,
        response: &str,
    ) -> Result<(), PersistenceError> {
        self.inner.append_transcript(request, response).await
    }

    async fn transcript(&self, limit: usize) -> Result<Vec<TranscriptEntry>, PersistenceError> {
        self.inner.transcript(limit).await
    }
}
