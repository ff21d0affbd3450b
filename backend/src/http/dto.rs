//! Data Transfer Objects for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::models::CalculationRecord;

/// Success body of the calculation endpoints.
pub use crate::services::CalculationOutcome as CalculationResponse;

/// Stats body; the stored aggregate already has the wire shape.
pub use crate::models::CalculationStats as StatsResponse;

/// Endpoints listed by `/health`.
pub const AVAILABLE_ENDPOINTS: [&str; 5] = [
    "POST /api/v1/power",
    "POST /api/v1/fibonacci",
    "POST /api/v1/factorial",
    "GET /api/v1/history",
    "GET /api/v1/stats",
];

/// Body of every 4xx/5xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Human-readable error message
    pub error: String,
    /// Operation that failed (`power`, `history`, ..., or `unknown`)
    pub operation: String,
    /// When the error occurred (RFC 3339)
    pub timestamp: String,
    /// HTTP status code, repeated in the body
    pub status_code: u16,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process is serving
    pub status: String,
    pub api_version: String,
    pub available_endpoints: Vec<String>,
    /// `connected` or `disconnected`
    pub database: String,
}

/// Calculation history response.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    /// Number of records in `calculations`
    pub total_records: usize,
    /// Newest first
    pub calculations: Vec<CalculationRecord>,
}

/// Query parameters for the history endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}
