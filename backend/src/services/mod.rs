//! Request-side services: boundary validation and the calculation pipeline.

pub mod pipeline;
pub mod validation;

pub use pipeline::{CalculationOutcome, CalculationPipeline, PipelineError};
pub use validation::{ValidationError, ValidationResult};
