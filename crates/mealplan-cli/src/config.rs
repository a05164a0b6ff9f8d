//! Configuration file management for mealplan.
//!
//! Provides a TOML-based config file at `~/.config/mealplan/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use mealplan_core::generation::GeminiConfig;
use mealplan_core::generation::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use mealplan_core::{OrchestratorConfig, RetryPolicy};
use mealplan_db::config::DbConfig;

pub const API_KEY_ENV: &str = "MEALPLAN_API_KEY";
pub const MODEL_ENV: &str = "MEALPLAN_MODEL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub generation: GenerationSection,
    pub planner: PlannerSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSection {
    pub batch_size: u32,
    pub inter_batch_delay_ms: u64,
    pub persist_attempts: u32,
    pub persist_backoff_ms: u64,
}

impl Default for PlannerSection {
    fn default() -> Self {
        let orchestrator = OrchestratorConfig::default();
        Self {
            batch_size: orchestrator.batch_size,
            inter_batch_delay_ms: orchestrator.inter_batch_delay.as_millis() as u64,
            persist_attempts: orchestrator.persist_policy.max_attempts,
            persist_backoff_ms: orchestrator.persist_policy.backoff.as_millis() as u64,
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the mealplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/mealplan` or
/// `~/.config/mealplan`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("mealplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mealplan")
}

/// Return the path to the mealplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write `config` to `path`, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The file may hold an API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct MealplanConfig {
    pub db_config: DbConfig,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub generation_timeout: Option<Duration>,
    pub orchestrator: OrchestratorConfig,
}

impl MealplanConfig {
    /// Resolve from the real environment and config file.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let path = config_path();
        let file = if path.exists() {
            Some(load_config_from(&path)?)
        } else {
            None
        };
        Ok(Self::resolve_with(cli_db_url, |key| std::env::var(key).ok(), file))
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `MEALPLAN_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - API key: `MEALPLAN_API_KEY` > `generation.api_key` > none
    /// - Model: `MEALPLAN_MODEL` > `generation.model` > `gemini-1.5-pro`
    pub fn resolve_with(
        cli_db_url: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
        file: Option<ConfigFile>,
    ) -> Self {
        let file = file.unwrap_or_default();

        let db_url = cli_db_url
            .map(str::to_string)
            .or_else(|| env(DbConfig::ENV_VAR))
            .or(file.database.url)
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_string());

        let api_key = env(API_KEY_ENV)
            .or(file.generation.api_key)
            .filter(|key| !key.trim().is_empty());
        let model = env(MODEL_ENV)
            .or(file.generation.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = file
            .generation
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let generation_timeout = file.generation.timeout_secs.map(Duration::from_secs);

        let planner = file.planner;
        let orchestrator = OrchestratorConfig {
            batch_size: planner.batch_size,
            inter_batch_delay: Duration::from_millis(planner.inter_batch_delay_ms),
            persist_policy: RetryPolicy::new(
                planner.persist_attempts,
                Duration::from_millis(planner.persist_backoff_ms),
            ),
            generation_timeout,
        };

        Self {
            db_config: DbConfig::new(db_url),
            api_key,
            model,
            base_url,
            generation_timeout,
            orchestrator,
        }
    }

    /// Settings for the Gemini client. Fails when no API key is configured.
    pub fn gemini_config(&self) -> Result<GeminiConfig> {
        let Some(api_key) = self.api_key.clone() else {
            bail!(
                "API key not found; set {API_KEY_ENV} or run `mealplan init --api-key <KEY>`"
            );
        };
        Ok(GeminiConfig {
            api_key,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            timeout: self.generation_timeout,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
