use serde::Serialize;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::Config;
use crate::errors::AppError;

const SCHEMA: &str = include_str!("../migrations/0001_create_onboarding_applications.sql");

/// Bounded Postgres pool plus the throttled liveness probe.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    health: Arc<HealthCheckGate>,
}

/// Server details reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseInfo {
    pub version: String,
    pub database_name: String,
    pub current_user: String,
    pub table_count: i64,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let database_url = config
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres backend"))?;

        // Checked-out connections are pinged first; dead ones are dropped and replaced.
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .min_connections(config.db_min_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self::from_pool(
            pool,
            Duration::from_secs(config.db_health_check_interval_secs),
        ))
    }

    pub fn from_pool(pool: PgPool, health_check_interval: Duration) -> Self {
        Self {
            pool,
            health: Arc::new(HealthCheckGate::new(health_check_interval)),
        }
    }

    /// Creates the onboarding table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    /// Starts a unit of work.
    ///
    /// The returned transaction rolls back when dropped without `commit`, and
    /// its connection goes back to the pool on every exit path.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, AppError> {
        let pool = self.pool.clone();
        self.health
            .run_if_due(|| async move { sqlx::query("SELECT 1").execute(&pool).await.map(|_| ()) })
            .await;

        Ok(self.pool.begin().await?)
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn info(&self) -> Result<DatabaseInfo, AppError> {
        let (version, database_name, current_user): (String, String, String) =
            sqlx::query_as("SELECT version(), current_database()::text, current_user::text")
                .fetch_one(&self.pool)
                .await?;

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DatabaseInfo {
            version,
            database_name,
            current_user,
            table_count,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection pool closed");
    }
}

/// Runs a liveness probe at most once per `interval`, however many callers ask.
///
/// Callers that arrive while a probe is in flight wait for it and then see
/// the fresh timestamp, so probes never overlap.
pub struct HealthCheckGate {
    interval: Duration,
    last_check: Mutex<Option<Instant>>,
}

impl HealthCheckGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_check: Mutex::new(None),
        }
    }

    /// Returns `true` if the probe ran on this call.
    ///
    /// Probe failures are logged and not returned: the caller's own query
    /// will surface a dead database soon enough.
    pub async fn run_if_due<F, Fut, E>(&self, probe: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        let mut last_check = self.last_check.lock().await;
        if let Some(at) = *last_check {
            if at.elapsed() < self.interval {
                return false;
            }
        }

        match probe().await {
            Ok(()) => tracing::debug!("Database health check passed"),
            Err(e) => tracing::error!("Database health check failed: {}", e),
        }
        *last_check = Some(Instant::now());
        true
    }
}
