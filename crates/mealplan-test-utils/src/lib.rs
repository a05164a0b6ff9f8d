//! Shared PostgreSQL for mealplan integration tests.
//!
//! Every test gets its own freshly migrated database inside one shared
//! server:
//! - **`MEALPLAN_TEST_PG_URL`** set: use that server directly.
//! - otherwise: start a container through testcontainers once per test
//!   binary and keep it alive in a `OnceCell`.

use std::time::Duration;

use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use mealplan_db::config::DbConfig;
use mealplan_db::pool;

struct SharedPg {
    base_url: String,
    /// Keeps the container alive. `None` for an external server.
    _container: Option<ContainerAsync<Postgres>>,
}

static SHARED_PG: OnceCell<SharedPg> = OnceCell::const_new();

async fn init_shared_pg() -> SharedPg {
    if let Ok(url) = std::env::var("MEALPLAN_TEST_PG_URL") {
        return SharedPg {
            base_url: url.trim_end_matches('/').to_string(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("16")
        .start()
        .await
        .expect("failed to start PostgreSQL container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    SharedPg {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Config for `database` on the shared server.
async fn server_config(database: &str, max_connections: u32) -> DbConfig {
    let shared = SHARED_PG.get_or_init(init_shared_pg).await;
    DbConfig {
        max_connections,
        acquire_timeout: Duration::from_secs(30),
        ..DbConfig::new(format!("{}/{database}", shared.base_url))
    }
}

async fn maintenance_pool() -> PgPool {
    pool::create_pool(&server_config("postgres", 1).await)
        .await
        .expect("failed to connect to maintenance database")
}

/// A uniquely named, migrated database. Call [`TestDb::teardown`] when done.
pub struct TestDb {
    pub pool: PgPool,
    pub name: String,
}

impl TestDb {
    /// Create a temporary database and apply all migrations.
    pub async fn create() -> Self {
        let maint = maintenance_pool().await;
        let name = format!("mealplan_test_{}", Uuid::new_v4().simple());
        maint
            .execute(format!("CREATE DATABASE {name}").as_str())
            .await
            .unwrap_or_else(|e| panic!("failed to create temp database {name}: {e}"));
        maint.close().await;

        let pool = pool::create_pool(&server_config(&name, 5).await)
            .await
            .unwrap_or_else(|e| panic!("failed to connect to temp database {name}: {e}"));

        pool::run_migrations(&pool)
            .await
            .expect("migrations should succeed");

        Self { pool, name }
    }

    /// Close the pool and drop the database.
    pub async fn teardown(self) {
        self.pool.close().await;

        let maint = maintenance_pool().await;
        let terminate = format!(
            "SELECT pg_terminate_backend(pid) \
             FROM pg_stat_activity \
             WHERE datname = '{}' AND pid <> pg_backend_pid()",
            self.name
        );
        let _ = maint.execute(terminate.as_str()).await;
        let _ = maint
            .execute(format!("DROP DATABASE IF EXISTS {}", self.name).as_str())
            .await;
        maint.close().await;
    }
}
