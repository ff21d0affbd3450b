//! SQLite repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures ("database is locked")
//! - Automatic migration execution on startup
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL`: Path to the SQLite file (default: `math_calculations.db`)
//! - `SQLITE_POOL_MAX`: Maximum pool size (default: 4)
//! - `SQLITE_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `SQLITE_BUSY_TIMEOUT_MS`: How long a writer waits on a locked database (default: 5000)
//! - `SQLITE_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `SQLITE_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 50)

use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::dsl::{avg, count_star};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    CalculationRepository, ErrorContext, RepositoryError, RepositoryResult,
    StatisticsRepository,
};
use crate::models::{CalculationRecord, CalculationStats, NewCalculation, Operation};

mod models;
mod schema;

use models::{CalculationRow, NewCalculationRow};
use schema::calculations;

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/sqlite/migrations");

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "math_calculations.db";

const IN_MEMORY_URL: &str = ":memory:";

/// Configuration for opening the SQLite store.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteConfig {
    /// Path to the database file, or `:memory:`
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Connection checkout timeout in seconds
    pub connection_timeout_sec: u64,
    /// `PRAGMA busy_timeout` applied to every connection
    pub busy_timeout_ms: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_pool_size: 4,
            connection_timeout_sec: 30,
            busy_timeout_ms: 5_000,
            max_retries: 3,
            retry_delay_ms: 50,
        }
    }
}

impl SqliteConfig {
    /// Create configuration from environment variables.
    ///
    /// Unset or empty values fall back to their defaults.
    ///
    /// # Errors
    /// Returns an error if a `SQLITE_*` value does not parse, or if
    /// `SQLITE_POOL_MAX` is set to zero.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.database_url);

        let max_pool_size = env_or("SQLITE_POOL_MAX", defaults.max_pool_size)?;
        if max_pool_size == 0 {
            return Err("SQLITE_POOL_MAX must be at least 1".to_string());
        }

        Ok(Self {
            database_url,
            max_pool_size,
            connection_timeout_sec: env_or("SQLITE_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec)?,
            busy_timeout_ms: env_or("SQLITE_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms)?,
            max_retries: env_or("SQLITE_MAX_RETRIES", defaults.max_retries)?,
            retry_delay_ms: env_or("SQLITE_RETRY_DELAY_MS", defaults.retry_delay_ms)?,
        })
    }

    /// Create a new configuration with a database path.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_url == IN_MEMORY_URL
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| format!("Invalid value for {}: '{}' ({})", name, raw, e)),
        _ => Ok(default),
    }
}

/// Per-connection pragmas.
#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas {
    busy_timeout_ms: u64,
    wal: bool,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let mut pragmas = format!("PRAGMA busy_timeout = {};", self.busy_timeout_ms);
        if self.wal {
            pragmas.push_str(" PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;");
        }
        conn.batch_execute(&pragmas)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Diesel-backed repository for SQLite.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
    config: SqliteConfig,
}

impl SqliteRepository {
    /// Open (creating if absent) the database and run pending migrations.
    ///
    /// # Returns
    /// * `Ok(SqliteRepository)` on success
    /// * `Err(RepositoryError)` if the file cannot be opened or migrated
    pub fn new(mut config: SqliteConfig) -> RepositoryResult<Self> {
        if config.is_in_memory() {
            // Every connection to `:memory:` is a separate database.
            config.max_pool_size = 1;
        } else if let Some(parent) = Path::new(&config.database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RepositoryError::connection_with_context(
                        e.to_string(),
                        ErrorContext::new("create_database_dir")
                            .with_details(parent.display().to_string()),
                    )
                })?;
            }
        }

        let manager = ConnectionManager::<SqliteConnection>::new(&config.database_url);
        let mut builder = Pool::builder()
            .max_size(config.max_pool_size)
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .connection_customizer(Box::new(ConnectionPragmas {
                busy_timeout_ms: config.busy_timeout_ms,
                wal: !config.is_in_memory(),
            }));
        if config.is_in_memory() {
            // The database lives exactly as long as its one connection.
            builder = builder.idle_timeout(None).max_lifetime(None);
        }
        let pool = builder
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("database_url={}", config.database_url)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut *conn)?;
        }

        log::info!(
            "SQLite repository ready (database={}, pool_max={})",
            config.database_url,
            config.max_pool_size
        );

        Ok(Self { pool, config })
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    fn run_migrations(conn: &mut SqliteConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation on a pooled connection, retrying
    /// transient failures with exponential backoff.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    log::debug!("Retrying {} (attempt {})", operation, attempt + 1);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new(operation)
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut *conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e.with_operation(operation)),
                }
            }

            Err(last_error
                .unwrap_or_else(|| RepositoryError::internal("Max retries exceeded with no error captured"))
                .with_operation(operation))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

#[async_trait]
impl CalculationRepository for SqliteRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            conn.batch_execute("SELECT 1")
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn append_calculation(
        &self,
        calculation: &NewCalculation,
    ) -> RepositoryResult<CalculationRecord> {
        let new_row = NewCalculationRow::from(calculation);
        self.with_conn("append_calculation", move |conn| {
            let row: CalculationRow = diesel::insert_into(calculations::table)
                .values(&new_row)
                .returning(CalculationRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            row.into_record()
        })
        .await
    }

    async fn recent_calculations(&self, limit: usize) -> RepositoryResult<Vec<CalculationRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn("recent_calculations", move |conn| {
            let rows = calculations::table
                .select(CalculationRow::as_select())
                .order((calculations::created_at.desc(), calculations::id.desc()))
                .limit(limit)
                .load::<CalculationRow>(conn)
                .map_err(map_diesel_error)?;

            rows.into_iter().map(CalculationRow::into_record).collect()
        })
        .await
    }

    async fn count_calculations(&self) -> RepositoryResult<u64> {
        self.with_conn("count_calculations", |conn| {
            let total: i64 = calculations::table
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(total.max(0) as u64)
        })
        .await
    }

    async fn clear_calculations(&self) -> RepositoryResult<usize> {
        let removed = self
            .with_conn("clear_calculations", |conn| {
                diesel::delete(calculations::table)
                    .execute(conn)
                    .map_err(map_diesel_error)
            })
            .await?;
        log::info!("Cleared {} calculations from {}", removed, self.config.database_url);
        Ok(removed)
    }
}

#[async_trait]
impl StatisticsRepository for SqliteRepository {
    async fn operation_stats(&self) -> RepositoryResult<CalculationStats> {
        self.with_conn("operation_stats", |conn| {
            let grouped: Vec<(String, i64, Option<f64>)> = calculations::table
                .group_by(calculations::operation)
                .select((
                    calculations::operation,
                    count_star(),
                    avg(calculations::execution_time_ms),
                ))
                .load(conn)
                .map_err(map_diesel_error)?;

            let mut stats = CalculationStats::default();
            for (operation, count, average) in grouped {
                let operation: Operation = operation.parse().map_err(|e: String| {
                    RepositoryError::internal_with_context(
                        e,
                        ErrorContext::new("operation_stats").with_entity("calculation"),
                    )
                })?;
                let count = count.max(0) as u64;
                stats.total_calculations += count;
                stats.operations_count.insert(operation, count);
                stats
                    .average_execution_times
                    .insert(operation, average.unwrap_or(0.0));
            }

            Ok(stats)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalculationInput, CalculationResult, PowerInput, SequenceInput};
    use num_bigint::BigUint;

    fn open_temp() -> (tempfile::TempDir, SqliteRepository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calc.db");
        let repo = SqliteRepository::new(SqliteConfig::with_url(path.to_string_lossy())).unwrap();
        (dir, repo)
    }

    fn power_calc(base: f64, exponent: f64, ms: f64) -> NewCalculation {
        NewCalculation {
            input_data: CalculationInput::Power(PowerInput { base, exponent }),
            result: CalculationResult::Float(base.powf(exponent)),
            execution_time_ms: ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_ids() {
        let (_dir, repo) = open_temp();
        let a = repo.append_calculation(&power_calc(2.0, 3.0, 0.01)).await.unwrap();
        let b = repo.append_calculation(&power_calc(2.0, 4.0, 0.02)).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(a.result, CalculationResult::Float(8.0));
        assert_eq!(a.operation, Operation::Power);
    }

    #[tokio::test]
    async fn test_big_integer_survives_storage() {
        let (_dir, repo) = open_temp();
        let f100 = crate::algorithms::factorial(100).unwrap();
        let calc = NewCalculation {
            input_data: CalculationInput::Factorial(SequenceInput { n: 100 }),
            result: CalculationResult::Integer(f100.clone()),
            execution_time_ms: 0.05,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        repo.append_calculation(&calc).await.unwrap();

        let recent = repo.recent_calculations(1).await.unwrap();
        assert_eq!(recent[0].result, CalculationResult::Integer(f100));
        assert_ne!(recent[0].result, CalculationResult::Integer(BigUint::from(0u32)));
    }

    #[tokio::test]
    async fn test_recent_newest_first() {
        let (_dir, repo) = open_temp();
        for exponent in 0..4 {
            repo.append_calculation(&power_calc(2.0, exponent as f64, 0.01))
                .await
                .unwrap();
        }
        let recent = repo.recent_calculations(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].id > recent[1].id);
        assert_eq!(recent[0].result, CalculationResult::Float(8.0));
    }

    #[tokio::test]
    async fn test_stats_group_by_operation() {
        let (_dir, repo) = open_temp();
        repo.append_calculation(&power_calc(2.0, 1.0, 1.0)).await.unwrap();
        repo.append_calculation(&power_calc(2.0, 2.0, 2.0)).await.unwrap();
        let stats = repo.operation_stats().await.unwrap();
        assert_eq!(stats.total_calculations, 2);
        assert_eq!(stats.operations_count[&Operation::Power], 2);
        assert!((stats.average_execution_times[&Operation::Power] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_file_database_keeps_connection_recycling() {
        let (_dir, repo) = open_temp();
        assert!(repo.pool.idle_timeout().is_some());
        assert!(repo.pool.max_lifetime().is_some());
    }

    #[tokio::test]
    async fn test_clear_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("calc.db");
        let config = SqliteConfig::with_url(path.to_string_lossy());

        let repo = SqliteRepository::new(config.clone()).unwrap();
        repo.append_calculation(&power_calc(3.0, 2.0, 0.1)).await.unwrap();
        drop(repo);

        // Migrations are idempotent and data persists across opens.
        let repo = SqliteRepository::new(config).unwrap();
        assert_eq!(repo.count_calculations().await.unwrap(), 1);
        assert_eq!(repo.clear_calculations().await.unwrap(), 1);
        assert!(repo.recent_calculations(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_uses_single_connection() {
        let repo = SqliteRepository::new(SqliteConfig::with_url(":memory:")).unwrap();
        assert_eq!(repo.config().max_pool_size, 1);
        assert_eq!(repo.pool.max_size(), 1);
        // The reaper must never recycle the connection that holds the data.
        assert_eq!(repo.pool.idle_timeout(), None);
        assert_eq!(repo.pool.max_lifetime(), None);
        assert!(repo.health_check().await.unwrap());
        repo.append_calculation(&power_calc(1.0, 1.0, 0.0)).await.unwrap();
        assert_eq!(repo.count_calculations().await.unwrap(), 1);
    }
}
