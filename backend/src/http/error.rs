//! HTTP error handling.
//!
//! Every failure leaves the server as an [`ErrorEnvelope`] whose
//! `status_code` matches the response status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::ErrorEnvelope;
use crate::db::repository::RepositoryError;
use crate::models::Operation;
use crate::services::PipelineError;

/// Operation label used for requests that matched no route.
pub const UNKNOWN_OPERATION: &str = "unknown";

/// Application error type for HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A calculation endpoint failed in the pipeline.
    #[error("{source}")]
    Calculation {
        operation: Operation,
        #[source]
        source: PipelineError,
    },

    /// The request was rejected before reaching the pipeline.
    #[error("{message}")]
    BadRequest {
        operation: String,
        status: StatusCode,
        message: String,
    },

    /// A read endpoint could not reach the store. The public message is fixed.
    #[error("{message}")]
    Repository {
        operation: String,
        message: &'static str,
        #[source]
        source: RepositoryError,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// A handler panicked. Details stay in the log.
    #[error("Internal error")]
    Internal,
}

impl AppError {
    pub fn bad_request(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            operation: operation.into(),
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Calculation { .. } => StatusCode::BAD_REQUEST,
            AppError::Repository { .. } | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest { status, .. } => *status,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            AppError::Calculation { operation, .. } => operation.as_str(),
            AppError::BadRequest { operation, .. } | AppError::Repository { operation, .. } => {
                operation
            }
            AppError::NotFound(_) | AppError::MethodNotAllowed | AppError::Internal => {
                UNKNOWN_OPERATION
            }
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.to_string(),
            operation: self.operation().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            status_code: self.status().as_u16(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Repository { source, .. } => {
                tracing::error!(operation = self.operation(), error = %source, "store failure");
            }
            _ if status.is_server_error() => {
                tracing::error!(operation = self.operation(), error = %self, "request failed");
            }
            _ => {
                tracing::debug!(operation = self.operation(), error = %self, "request rejected");
            }
        }

        (status, Json(self.envelope())).into_response()
    }
}
