//! Router configuration for the HTTP API.
//!
//! Sets up all routes, middleware (CORS, compression, tracing, panic
//! recovery) and the error-envelope fallbacks.

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::error::AppError;
use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/power", post(handlers::power))
        .route("/fibonacci", post(handlers::fibonacci))
        .route("/factorial", post(handlers::factorial))
        .route("/health", get(handlers::health_check))
        .route("/history", get(handlers::history))
        .route("/stats", get(handlers::stats))
        .method_not_allowed_fallback(handlers::method_not_allowed);

    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .nest("/api/v1", api_v1)
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Turn a handler panic into the generic 500 envelope.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "handler panicked");
    AppError::Internal.into_response()
}
