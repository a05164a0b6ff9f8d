use std::env;
use std::time::Duration;

/// Where the meal-plan store lives and how many connections it may use.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL, e.g. `postgresql://host:5432/mealplan`.
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

/// A connection URL split around its database name.
struct UrlParts<'a> {
    /// Scheme, credentials, host and port, without the trailing `/`.
    server: &'a str,
    database: &'a str,
    /// Everything from `?` on, or empty.
    query: &'a str,
}

fn split_url(url: &str) -> Option<UrlParts<'_>> {
    let (before_query, query) = match url.find('?') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };
    let after_scheme = before_query.find("://").map_or(0, |pos| pos + 3);
    let slash = before_query[after_scheme..].find('/')? + after_scheme;
    Some(UrlParts {
        server: &before_query[..slash],
        database: &before_query[slash + 1..],
        query,
    })
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/mealplan";

    /// Environment variable consulted by [`DbConfig::from_env`].
    pub const ENV_VAR: &str = "MEALPLAN_DATABASE_URL";

    const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

    /// `MEALPLAN_DATABASE_URL`, or [`DbConfig::DEFAULT_URL`] when unset.
    pub fn from_env() -> Self {
        Self::new(env::var(Self::ENV_VAR).unwrap_or_else(|_| Self::DEFAULT_URL.to_owned()))
    }

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Name of the target database, without any query string.
    pub fn database_name(&self) -> Option<&str> {
        split_url(&self.database_url)
            .map(|parts| parts.database)
            .filter(|name| !name.is_empty() && !name.contains('/'))
    }

    /// Same server and options, but the `postgres` maintenance database.
    /// `CREATE DATABASE` is issued from there.
    pub fn maintenance_url(&self) -> String {
        self.with_database("postgres")
    }

    /// Same server and options, pointed at `database`.
    pub fn with_database(&self, database: &str) -> String {
        match split_url(&self.database_url) {
            Some(parts) => format!("{}/{database}{}", parts.server, parts.query),
            None => format!("{}/{database}", self.database_url.trim_end_matches('/')),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
