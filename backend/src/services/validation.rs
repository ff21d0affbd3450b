//! Boundary validation for calculation requests.
//!
//! Each operation has an explicit bounds check that turns a decoded JSON
//! object into a typed [`CalculationInput`]. Nothing here panics or throws;
//! callers get a [`ValidationError`] naming the field and the constraint.

use serde_json::{Map, Value};

use crate::algorithms::{FACTORIAL_MAX_N, FIBONACCI_MAX_N};
use crate::models::{CalculationInput, Operation, PowerInput, SequenceInput};

/// Largest absolute value accepted for `base` and `exponent`.
pub const POWER_MAX_ABS: f64 = 10_000.0;

/// A violated input constraint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate the request body for `operation`.
pub fn validate(operation: Operation, body: &Map<String, Value>) -> ValidationResult<CalculationInput> {
    match operation {
        Operation::Power => validate_power(body).map(CalculationInput::Power),
        Operation::Fibonacci => {
            validate_sequence(body, FIBONACCI_MAX_N).map(CalculationInput::Fibonacci)
        }
        Operation::Factorial => {
            validate_sequence(body, FACTORIAL_MAX_N).map(CalculationInput::Factorial)
        }
    }
}

/// `base` and `exponent` must be numbers with `|x| <= 10000`.
pub fn validate_power(body: &Map<String, Value>) -> ValidationResult<PowerInput> {
    let base = require_number(body, "base")?;
    check_magnitude("base", base)?;
    let exponent = require_number(body, "exponent")?;
    check_magnitude("exponent", exponent)?;
    Ok(PowerInput { base, exponent })
}

/// `n` must be an integer in `0..=max`.
pub fn validate_sequence(body: &Map<String, Value>, max: i64) -> ValidationResult<SequenceInput> {
    let n = require_integer(body, "n", 0, max)?;
    Ok(SequenceInput { n })
}

fn require_field<'a>(body: &'a Map<String, Value>, field: &str) -> ValidationResult<&'a Value> {
    match body.get(field) {
        None | Some(Value::Null) => Err(ValidationError::new(field, "field required")),
        Some(value) => Ok(value),
    }
}

fn require_number(body: &Map<String, Value>, field: &str) -> ValidationResult<f64> {
    let value = require_field(body, field)?;
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::new(field, "must be a number"))
}

fn check_magnitude(field: &str, value: f64) -> ValidationResult<()> {
    if value.abs() > POWER_MAX_ABS {
        return Err(ValidationError::new(
            field,
            format!("Number too large (max absolute value: {})", POWER_MAX_ABS),
        ));
    }
    Ok(())
}

fn require_integer(
    body: &Map<String, Value>,
    field: &str,
    min: i64,
    max: i64,
) -> ValidationResult<i64> {
    let value = require_field(body, field)?;
    let out_of_range =
        || ValidationError::new(field, format!("must be between {} and {}", min, max));

    let number = match value {
        Value::Number(number) => number,
        _ => return Err(ValidationError::new(field, "must be an integer")),
    };

    let n = match number.as_i64() {
        Some(n) => n,
        None => {
            // Integral floats such as `10.0` are accepted; anything else is not.
            let f = number
                .as_f64()
                .ok_or_else(|| ValidationError::new(field, "must be an integer"))?;
            if f.fract() != 0.0 || !f.is_finite() {
                return Err(ValidationError::new(field, "must be an integer"));
            }
            if f < min as f64 || f > max as f64 {
                return Err(out_of_range());
            }
            f as i64
        }
    };

    if n < min || n > max {
        return Err(out_of_range());
    }
    Ok(n)
}
