//! HTTP handlers for the REST API.
//!
//! Calculation handlers take the raw body so that decode failures go through
//! the same error envelope as every other failure.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, rejection::QueryRejection, Query, State},
    http::Uri,
    Json,
};

use super::dto::{
    CalculationResponse, HealthResponse, HistoryQuery, HistoryResponse, StatsResponse,
    AVAILABLE_ENDPOINTS,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::Operation;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Calculations
// =============================================================================

/// POST /api/v1/power
pub async fn power(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> HandlerResult<CalculationResponse> {
    calculate(&state, Operation::Power, body).await
}

/// POST /api/v1/fibonacci
pub async fn fibonacci(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> HandlerResult<CalculationResponse> {
    calculate(&state, Operation::Fibonacci, body).await
}

/// POST /api/v1/factorial
pub async fn factorial(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> HandlerResult<CalculationResponse> {
    calculate(&state, Operation::Factorial, body).await
}

async fn calculate(
    state: &AppState,
    operation: Operation,
    body: Result<Bytes, BytesRejection>,
) -> HandlerResult<CalculationResponse> {
    let body = body.map_err(|rejection| AppError::BadRequest {
        operation: operation.to_string(),
        status: rejection.status(),
        message: rejection.body_text(),
    })?;

    let outcome = state
        .pipeline
        .run(operation, &body)
        .await
        .map_err(|source| AppError::Calculation { operation, source })?;

    Ok(Json(outcome))
}

// =============================================================================
// Health / History / Stats
// =============================================================================

/// GET /api/v1/health
///
/// Reports the service as healthy whenever it can answer; the store's state
/// is reported separately in `database`.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let database = if db_services::health_check(state.repository.as_ref()).await {
        "connected"
    } else {
        "disconnected"
    };

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        api_version: "v1".to_string(),
        available_endpoints: AVAILABLE_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        database: database.to_string(),
    }))
}

/// GET /api/v1/history?limit=N
///
/// Newest first. `limit` defaults to the configured cap and is clamped to it.
pub async fn history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> HandlerResult<HistoryResponse> {
    let Query(query) =
        query.map_err(|rejection| AppError::bad_request("history", rejection.body_text()))?;

    let limit = match query.limit {
        Some(0) => return Err(AppError::bad_request("history", "limit must be at least 1")),
        Some(limit) => limit.min(state.history_limit),
        None => state.history_limit,
    };

    let calculations = db_services::history(state.repository.as_ref(), limit)
        .await
        .map_err(|source| AppError::Repository {
            operation: "history".to_string(),
            message: "Failed to retrieve history",
            source,
        })?;

    Ok(Json(HistoryResponse {
        total_records: calculations.len(),
        calculations,
    }))
}

/// GET /api/v1/stats
pub async fn stats(State(state): State<AppState>) -> HandlerResult<StatsResponse> {
    let stats = db_services::stats(state.repository.as_ref())
        .await
        .map_err(|source| AppError::Repository {
            operation: "stats".to_string(),
            message: "Failed to retrieve stats",
            source,
        })?;

    Ok(Json(stats))
}

// =============================================================================
// Fallbacks
// =============================================================================

/// Any path without a route.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// A known path called with the wrong method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
