//! `PgGateway` against a real PostgreSQL database.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use mealplan_core::completion::toggle_meal;
use mealplan_core::persistence::PgGateway;
use mealplan_core::{
    BatchOrchestrator, CalendarIndex, MealType, OrchestratorConfig, PersistenceError,
    PersistenceGateway, RetryPolicy,
};
use mealplan_test_utils::TestDb;

use common::{ScriptedGenerator, canonical_days, date};

#[tokio::test]
async fn orchestrated_plan_round_trips_through_postgres() {
    let db = TestDb::create().await;
    let gateway = Arc::new(PgGateway::new(db.pool.clone()));
    let generator = Arc::new(ScriptedGenerator::texts(vec![canonical_days(1, 3)]));
    let index = CalendarIndex::new();
    let config = OrchestratorConfig {
        inter_batch_delay: Duration::ZERO,
        persist_policy: RetryPolicy::new(1, Duration::ZERO),
        ..OrchestratorConfig::default()
    };
    let orch = BatchOrchestrator::new(generator, gateway.clone(), index.clone(), config);

    let start = date(2025, 10, 6);
    let outcome = orch
        .run("a 3 day meal plan", start, CancellationToken::new())
        .await
        .expect("plan succeeds");
    assert_eq!(outcome.committed(), 3);

    let stored = gateway
        .day_plans_in_range(start, date(2025, 10, 31))
        .await
        .expect("range");
    assert_eq!(stored, outcome.days);

    let fresh = CalendarIndex::new();
    let loaded = fresh
        .hydrate(gateway.as_ref(), start, date(2025, 10, 8))
        .await
        .expect("hydrate");
    assert_eq!(loaded, 3);
    assert_eq!(
        fresh.summary(date(2025, 10, 7)).await,
        vec!["Breakfast", "Lunch", "Dinner"]
    );

    let transcript = gateway.transcript(5).await.expect("transcript");
    assert_eq!(transcript.len(), 1);
    assert!(transcript[0].response_text.starts_with("Day 1:"));

    db.teardown().await;
}

#[tokio::test]
async fn completion_toggle_persists() {
    let db = TestDb::create().await;
    let gateway = PgGateway::new(db.pool.clone());
    let index = CalendarIndex::new();
    let policy = RetryPolicy::new(1, Duration::ZERO);

    let generator = Arc::new(ScriptedGenerator::texts(vec![canonical_days(1, 1)]));
    let orch = BatchOrchestrator::new(
        generator,
        Arc::new(gateway.clone()),
        index.clone(),
        OrchestratorConfig::default(),
    );
    let day = date(2025, 10, 6);
    orch.run("dinner for tonight", day, CancellationToken::new())
        .await
        .expect("plan succeeds");

    // A fresh index forces the lookup through the database.
    let cold_index = CalendarIndex::new();
    let completion = toggle_meal(&gateway, &cold_index, day, MealType::Breakfast, &policy)
        .await
        .expect("toggle");
    assert!(completion.breakfast);

    let stored = gateway.get_day_plan(day).await.unwrap().unwrap();
    assert!(stored.completed.breakfast);
    assert!(!stored.completed.lunch);

    let err = gateway
        .update_completion(date(2030, 1, 1), completion)
        .await
        .unwrap_err();
    assert!(matches!(err, PersistenceError::NotFound(_)));

    db.teardown().await;
}
