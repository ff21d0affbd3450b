//! Service layer for calculation storage.
//!
//! Thin functions over [`FullRepository`] used by the pipeline and the HTTP
//! handlers. They own the logging policy for storage calls so handlers do
//! not repeat it.

use crate::db::repository::{FullRepository, RepositoryResult};
use crate::models::{CalculationRecord, CalculationStats, NewCalculation};

/// Persist a completed calculation.
///
/// Failures are logged at `warn` and returned as `None`; a calculation is
/// never failed because it could not be recorded.
pub async fn record_calculation(
    repo: &dyn FullRepository,
    calculation: &NewCalculation,
) -> Option<CalculationRecord> {
    match repo.append_calculation(calculation).await {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!(
                "Failed to record {} calculation: {}",
                calculation.operation(),
                e
            );
            None
        }
    }
}

/// Up to `limit` most recent calculations, newest first.
pub async fn history(
    repo: &dyn FullRepository,
    limit: usize,
) -> RepositoryResult<Vec<CalculationRecord>> {
    repo.recent_calculations(limit).await.inspect_err(|e| {
        log::error!("Failed to load calculation history: {}", e);
    })
}

/// Aggregate statistics over every stored calculation.
pub async fn stats(repo: &dyn FullRepository) -> RepositoryResult<CalculationStats> {
    repo.operation_stats().await.inspect_err(|e| {
        log::error!("Failed to compute calculation stats: {}", e);
    })
}

/// Delete every stored calculation, returning how many were removed.
pub async fn clear_history(repo: &dyn FullRepository) -> RepositoryResult<usize> {
    let removed = repo.clear_calculations().await?;
    log::warn!("Calculation history cleared ({} records)", removed);
    Ok(removed)
}

/// Report whether the store answers; errors count as unhealthy.
pub async fn health_check(repo: &dyn FullRepository) -> bool {
    match repo.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            log::warn!("Repository health check failed: {}", e);
            false
        }
    }
}
