//! `mealplan transcript` command: show recent generation calls.

use anyhow::{Context, Result};

use mealplan_core::PersistenceGateway;

use crate::display;

pub async fn run_transcript(gateway: &dyn PersistenceGateway, limit: usize) -> Result<()> {
    let entries = gateway
        .transcript(limit)
        .await
        .context("failed to load transcript")?;

    if entries.is_empty() {
        println!("Transcript is empty.");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", display::format_transcript_entry(entry));
    }
    Ok(())
}
