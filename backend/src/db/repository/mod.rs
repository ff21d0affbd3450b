//! Repository traits for calculation persistence.
//!
//! Storage is split into the write/read log ([`CalculationRepository`]) and
//! read-side aggregation ([`StatisticsRepository`]). Handlers depend on
//! [`FullRepository`], which any type implementing both gets for free.
//!
//! # Thread Safety
//! Implementations must be `Send + Sync`; a single instance is shared by all
//! in-flight requests and must serialize concurrent writers internally.

use async_trait::async_trait;

use crate::models::{CalculationRecord, CalculationStats, NewCalculation};

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Append-only calculation log.
#[async_trait]
pub trait CalculationRepository: Send + Sync {
    /// Check that the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert a new record, assigning its `id` and `created_at`.
    ///
    /// # Returns
    /// * `Ok(CalculationRecord)` - The stored record
    /// * `Err(RepositoryError)` - If the store cannot be opened or written
    async fn append_calculation(
        &self,
        calculation: &NewCalculation,
    ) -> RepositoryResult<CalculationRecord>;

    /// Return up to `limit` records, newest first.
    async fn recent_calculations(&self, limit: usize) -> RepositoryResult<Vec<CalculationRecord>>;

    /// Total number of stored records.
    async fn count_calculations(&self) -> RepositoryResult<u64>;

    /// Delete every record. Irreversible.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records removed
    async fn clear_calculations(&self) -> RepositoryResult<usize>;
}

/// Read-side aggregation over the calculation log.
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// Total count plus per-operation counts and average execution times.
    ///
    /// Computed by a full scan on every call.
    async fn operation_stats(&self) -> RepositoryResult<CalculationStats>;
}

/// Everything the HTTP layer needs from a store.
pub trait FullRepository: CalculationRepository + StatisticsRepository {}

impl<T> FullRepository for T where T: CalculationRepository + StatisticsRepository {}
