//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::{ServerConfig, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_BODY_BYTES};
use crate::db::repository::FullRepository;
use crate::services::CalculationPipeline;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for history and stats reads
    pub repository: Arc<dyn FullRepository>,
    /// Calculation pipeline writing into the same repository
    pub pipeline: CalculationPipeline,
    /// Default and maximum number of records served by `/history`
    pub history_limit: usize,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create a new application state with default limits.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            pipeline: CalculationPipeline::new(Arc::clone(&repository)),
            repository,
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Create the state with limits taken from the server configuration.
    pub fn from_config(repository: Arc<dyn FullRepository>, config: &ServerConfig) -> Self {
        Self::new(repository)
            .with_history_limit(config.history_limit)
            .with_max_body_bytes(config.max_body_bytes)
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }
}
