//! `mealplan generate` command: run a request through the pipeline.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use mealplan_core::duration;
use mealplan_core::generation::GeminiClient;
use mealplan_core::persistence::{MemoryGateway, PgGateway};
use mealplan_core::{BatchOrchestrator, CalendarIndex, PersistenceGateway, PlanError};
use mealplan_db::pool;

use crate::config::MealplanConfig;
use crate::display;

/// Run the generate command.
///
/// With `memory` set, nothing touches the database and the plan is printed
/// only. Ctrl-C stops the run after the current step; days already stored
/// stay stored.
pub async fn run_generate(
    config: &MealplanConfig,
    text: &str,
    start: NaiveDate,
    memory: bool,
) -> Result<()> {
    // Reject off-topic requests before asking for credentials.
    let days = duration::resolve_request(text)?;

    let generator = Arc::new(GeminiClient::new(config.gemini_config()?)?);

    let db_pool = if memory {
        None
    } else {
        Some(pool::create_pool(&config.db_config).await?)
    };
    let gateway: Arc<dyn PersistenceGateway> = match &db_pool {
        Some(db_pool) => Arc::new(PgGateway::new(db_pool.clone())),
        None => Arc::new(MemoryGateway::new()),
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after the current step");
            on_signal.cancel();
        }
    });

    println!(
        "Planning {days} day(s) starting {} with {}...",
        start.format("%Y-%m-%d"),
        generator.model()
    );

    let orchestrator = BatchOrchestrator::new(
        generator,
        gateway,
        CalendarIndex::new(),
        config.orchestrator.clone(),
    );
    let result = orchestrator.run(text, start, cancel).await;

    if let Some(db_pool) = db_pool {
        db_pool.close().await;
    }

    match result {
        Ok(outcome) => {
            println!();
            for day in &outcome.days {
                println!("{}", display::format_day(day));
            }
            println!(
                "{} of {days} day(s) saved in {} batch(es).",
                outcome.committed(),
                outcome.batches.len()
            );
            Ok(())
        }
        Err(err) => {
            if let Some(committed) = err.committed().filter(|n| *n > 0) {
                eprintln!("{committed} day(s) were saved before the run stopped.");
            }
            match &err {
                PlanError::IncompleteMealPlan { warnings, .. } => {
                    let listed = orchestrator
                        .index()
                        .range(start, NaiveDate::MAX)
                        .await;
                    for day in &listed {
                        println!("{}", display::format_day(day));
                    }
                    if !warnings.is_empty() {
                        eprintln!("Some days could not be saved:");
                        for warning in warnings {
                            eprintln!("{}", display::format_warning(warning));
                        }
                    }
                }
                PlanError::Generation { source, .. } if source.is_retryable() => {
                    eprintln!("The generation service may be busy; try again later.");
                }
                _ => {}
            }
            Err(err.into())
        }
    }
}
