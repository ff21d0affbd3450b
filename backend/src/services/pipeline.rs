//! Request pipeline shared by the calculation endpoints.
//!
//! Every calculation goes through the same steps:
//!
//! 1. decode the body into a JSON object
//! 2. validate it into a typed [`CalculationInput`]
//! 3. compute, timing only the engine call
//! 4. persist a record (failures are logged, never returned)
//! 5. hand back a [`CalculationOutcome`] for the response envelope

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::algorithms::{self, MathError};
use crate::db::repository::FullRepository;
use crate::db::services as store;
use crate::models::{CalculationId, CalculationInput, CalculationResult, NewCalculation, Operation};
use crate::services::validation::{self, ValidationError};

/// Why a calculation request did not produce a result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Body was missing, empty or not a JSON object.
    #[error("{0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The engine rejected otherwise valid input.
    #[error(transparent)]
    Domain(#[from] MathError),
}

/// A completed calculation, shaped like the success envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationOutcome {
    pub operation: Operation,
    pub input_data: CalculationInput,
    pub result: CalculationResult,
    pub timestamp: String,
    pub execution_time_ms: f64,
    /// Id of the stored record, if persisting succeeded.
    #[serde(skip)]
    pub record_id: Option<CalculationId>,
}

/// Runs calculations and records them in the injected repository.
#[derive(Clone)]
pub struct CalculationPipeline {
    repository: Arc<dyn FullRepository>,
}

impl CalculationPipeline {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self { repository }
    }

    /// Run `operation` against a raw request body.
    pub async fn run(
        &self,
        operation: Operation,
        body: &[u8],
    ) -> Result<CalculationOutcome, PipelineError> {
        let object = decode_body(body)?;
        let input = validation::validate(operation, &object)?;
        self.execute(input).await
    }

    /// Compute, time and persist an already validated input.
    pub async fn execute(&self, input: CalculationInput) -> Result<CalculationOutcome, PipelineError> {
        let started = Instant::now();
        let result = compute(&input)?;
        let execution_time_ms = round_ms(started.elapsed().as_secs_f64() * 1000.0);

        let calculation = NewCalculation {
            input_data: input,
            result,
            execution_time_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        log::debug!(
            "{} {:?} computed in {} ms",
            calculation.operation(),
            calculation.input_data,
            execution_time_ms
        );

        let record_id = store::record_calculation(self.repository.as_ref(), &calculation)
            .await
            .map(|record| record.id);

        Ok(CalculationOutcome {
            operation: calculation.operation(),
            input_data: calculation.input_data,
            result: calculation.result,
            timestamp: calculation.timestamp,
            execution_time_ms: calculation.execution_time_ms,
            record_id,
        })
    }
}

/// Parse a request body into a non-empty JSON object.
pub fn decode_body(body: &[u8]) -> Result<Map<String, Value>, PipelineError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(PipelineError::Decode("No JSON data provided".to_string()));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PipelineError::Decode(format!("Invalid JSON: {}", e)))?;

    match value {
        Value::Object(map) if map.is_empty() => {
            Err(PipelineError::Decode("No JSON data provided".to_string()))
        }
        Value::Object(map) => Ok(map),
        Value::Null => Err(PipelineError::Decode("No JSON data provided".to_string())),
        _ => Err(PipelineError::Decode(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Dispatch a validated input to the engine.
pub fn compute(input: &CalculationInput) -> Result<CalculationResult, MathError> {
    match input {
        CalculationInput::Power(p) => algorithms::power(p.base, p.exponent).map(CalculationResult::Float),
        CalculationInput::Fibonacci(s) => algorithms::fibonacci(s.n).map(CalculationResult::Integer),
        CalculationInput::Factorial(s) => algorithms::factorial(s.n).map(CalculationResult::Integer),
    }
}

fn round_ms(ms: f64) -> f64 {
    ((ms * 100.0).round() / 100.0).max(0.0)
}

#[cfg(all(test, feature = "local-repo"))]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use num_bigint::BigUint;

    fn pipeline() -> (Arc<LocalRepository>, CalculationPipeline) {
        let repo = Arc::new(LocalRepository::new());
        let pipeline = CalculationPipeline::new(repo.clone() as Arc<dyn FullRepository>);
        (repo, pipeline)
    }

    #[test]
    fn test_decode_body_rejects_empty_and_non_objects() {
        for body in [&b""[..], &b"   "[..], &b"{}"[..], &b"null"[..]] {
            let err = decode_body(body).unwrap_err();
            assert_eq!(err.to_string(), "No JSON data provided");
        }
        let err = decode_body(b"[1, 2]").unwrap_err();
        assert_eq!(err.to_string(), "Request body must be a JSON object");
        assert!(matches!(decode_body(b"{not json"), Err(PipelineError::Decode(_))));
    }

    #[tokio::test]
    async fn test_run_power_records_calculation() {
        let (repo, pipeline) = pipeline();
        let outcome = pipeline
            .run(Operation::Power, br#"{"base": 2, "exponent": 3}"#)
            .await
            .unwrap();

        assert_eq!(outcome.operation, Operation::Power);
        assert_eq!(outcome.result, CalculationResult::Float(8.0));
        assert!(outcome.execution_time_ms >= 0.0);
        assert!(outcome.record_id.is_some());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_run_fibonacci_and_factorial() {
        let (_repo, pipeline) = pipeline();
        let fib = pipeline.run(Operation::Fibonacci, br#"{"n": 10}"#).await.unwrap();
        assert_eq!(fib.result, CalculationResult::Integer(BigUint::from(55u32)));

        let fact = pipeline.run(Operation::Factorial, br#"{"n": 5}"#).await.unwrap();
        assert_eq!(fact.result, CalculationResult::Integer(BigUint::from(120u32)));
    }

    #[tokio::test]
    async fn test_validation_failure_is_not_recorded() {
        let (repo, pipeline) = pipeline();
        let err = pipeline
            .run(Operation::Fibonacci, br#"{"n": -1}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Invalid input: n: must be between 0 and 1000"
        );
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_domain_failure_maps_to_client_error() {
        let (repo, pipeline) = pipeline();
        let err = pipeline
            .run(Operation::Power, br#"{"base": -8, "exponent": 0.5}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Domain(MathError::InvalidOperand(_))));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_round_ms_two_decimals() {
        assert_eq!(round_ms(1.23456), 1.23);
        assert_eq!(round_ms(0.004), 0.0);
    }
}
