mod calendar_cmd;
mod config;
mod display;
mod generate_cmd;
mod transcript_cmd;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use mealplan_core::MealType;
use mealplan_core::persistence::PgGateway;
use mealplan_db::config::DbConfig;
use mealplan_db::pool;

use config::MealplanConfig;

#[derive(Parser)]
#[command(name = "mealplan", about = "Turn dietary requests into dated daily meal plans")]
struct Cli {
    /// Database URL (overrides MEALPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mealplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Gemini API key to store in the config file
        #[arg(long)]
        api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the mealplan database (requires config file or env vars)
    DbInit,
    /// Generate and store a meal plan from a free-form request
    Generate {
        /// The request, e.g. "a 5 day vegetarian meal plan"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// First day of the plan (YYYY-MM-DD, default: today)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Keep the plan in memory instead of the database
        #[arg(long)]
        memory: bool,
    },
    /// Show the stored plan for one date
    Show {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
    },
    /// List stored days in a date range
    Calendar {
        /// First date (default: today)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last date (default: 30 days after --from)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Mark a meal as done, or undo it
    Toggle {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
        /// breakfast, lunch, or dinner
        meal: MealType,
    },
    /// Show recent generation requests and responses
    Transcript {
        /// Number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First four characters of a long key, for confirming which key was saved.
fn key_preview(key: &str) -> String {
    if key.chars().count() > 8 {
        let head: String = key.chars().take(4).collect();
        format!("{head}...")
    } else {
        "(set)".to_string()
    }
}

/// Execute the `mealplan init` command: write config file.
fn cmd_init(db_url: &str, api_key: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: Some(db_url.to_string()),
        },
        generation: config::GenerationSection {
            api_key: api_key.map(str::to_string),
            ..config::GenerationSection::default()
        },
        planner: config::PlannerSection::default(),
    };

    config::save_config_to(&path, &cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    match api_key {
        Some(key) => println!("  generation.api_key = {}", key_preview(key)),
        None => println!("  generation.api_key = (not set; use {})", config::API_KEY_ENV),
    }
    println!();
    println!("Next: run `mealplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `mealplan db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = MealplanConfig::resolve(cli_db_url)?;

    println!("Initializing mealplan database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("mealplan db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            api_key,
            force,
        } => {
            cmd_init(&db_url, api_key.as_deref(), force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Generate {
            text,
            start,
            memory,
        } => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            let text = text.join(" ");
            let start = start.unwrap_or_else(today);
            generate_cmd::run_generate(&resolved, &text, start, memory).await?;
        }
        Commands::Show { date } => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let gateway = PgGateway::new(db_pool.clone());
            let result = calendar_cmd::run_show(&gateway, date).await;
            db_pool.close().await;
            result?;
        }
        Commands::Calendar { from, to } => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let gateway = PgGateway::new(db_pool.clone());
            let from = from.unwrap_or_else(today);
            let result = calendar_cmd::run_calendar(&gateway, from, to).await;
            db_pool.close().await;
            result?;
        }
        Commands::Toggle { date, meal } => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let gateway = PgGateway::new(db_pool.clone());
            let result = calendar_cmd::run_toggle(
                &gateway,
                date,
                meal,
                &resolved.orchestrator.persist_policy,
            )
            .await;
            db_pool.close().await;
            result?;
        }
        Commands::Transcript { limit } => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let gateway = PgGateway::new(db_pool.clone());
            let result = transcript_cmd::run_transcript(&gateway, limit).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_preview_shows_prefix_of_long_keys() {
        assert_eq!(key_preview("AIzaSyExampleKey"), "AIza...");
        assert_eq!(key_preview("short"), "(set)");
    }

    #[test]
    fn key_preview_respects_char_boundaries() {
        // Byte 4 falls inside the second 'é'.
        assert_eq!(key_preview("aéébcdefghij"), "aééb...");
        assert_eq!(key_preview("ключ-ключ-ключ"), "ключ...");
    }
}
