//! In-memory repository for tests and ephemeral runs.
//!
//! Records live in a `Vec` behind a `parking_lot::RwLock`; ids come from a
//! counter held under the same lock so they are strictly increasing in
//! insertion order. Nothing survives a restart.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repository::{
    CalculationRepository, RepositoryResult, StatisticsRepository,
};
use crate::models::{
    CalculationId, CalculationRecord, CalculationStats, NewCalculation, Operation,
};

#[derive(Debug, Default)]
struct LocalState {
    next_id: i64,
    records: Vec<CalculationRecord>,
}

/// In-memory calculation store.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    state: Arc<RwLock<LocalState>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CalculationRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn append_calculation(
        &self,
        calculation: &NewCalculation,
    ) -> RepositoryResult<CalculationRecord> {
        let mut state = self.state.write();
        state.next_id += 1;
        let record = CalculationRecord::from_new(
            CalculationId::new(state.next_id),
            calculation.clone(),
            chrono::Utc::now().naive_utc(),
        );
        state.records.push(record.clone());
        log::debug!(
            "Stored {} calculation in memory (id={})",
            record.operation,
            record.id
        );
        Ok(record)
    }

    async fn recent_calculations(&self, limit: usize) -> RepositoryResult<Vec<CalculationRecord>> {
        let state = self.state.read();
        // Insertion order is id order, so reverse iteration is newest first.
        Ok(state.records.iter().rev().take(limit).cloned().collect())
    }

    async fn count_calculations(&self) -> RepositoryResult<u64> {
        Ok(self.state.read().records.len() as u64)
    }

    async fn clear_calculations(&self) -> RepositoryResult<usize> {
        let mut state = self.state.write();
        let removed = state.records.len();
        state.records.clear();
        log::info!("Cleared {} in-memory calculations", removed);
        Ok(removed)
    }
}

#[async_trait]
impl StatisticsRepository for LocalRepository {
    async fn operation_stats(&self) -> RepositoryResult<CalculationStats> {
        let state = self.state.read();

        let mut totals: BTreeMap<Operation, (u64, f64)> = BTreeMap::new();
        for record in &state.records {
            let entry = totals.entry(record.operation).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += record.execution_time_ms;
        }

        let mut stats = CalculationStats {
            total_calculations: state.records.len() as u64,
            ..Default::default()
        };
        for (operation, (count, time_sum)) in totals {
            stats.operations_count.insert(operation, count);
            stats
                .average_execution_times
                .insert(operation, time_sum / count as f64);
        }

        Ok(stats)
    }
}
