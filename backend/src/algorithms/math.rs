//! Calculation engine: power, Fibonacci and factorial.
//!
//! These are pure functions with no shared state, safe to call from any
//! number of tasks at once. Range checks live here as well as at the HTTP
//! boundary so the engine never produces a result for an input it does not
//! support.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Largest supported Fibonacci position.
pub const FIBONACCI_MAX_N: i64 = 1000;

/// Largest supported factorial argument.
pub const FACTORIAL_MAX_N: i64 = 100;

/// Errors raised by the calculation engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    /// The operands do not produce a finite real number.
    #[error("Error calculating power: {0}")]
    InvalidOperand(String),

    /// An integer argument lies outside the supported range.
    #[error("{0}")]
    OutOfRange(String),
}

/// Compute `base^exponent`.
///
/// # Errors
/// Returns [`MathError::InvalidOperand`] when the result is NaN or infinite,
/// e.g. a negative base with a fractional exponent, zero raised to a negative
/// power, or overflow.
pub fn power(base: f64, exponent: f64) -> Result<f64, MathError> {
    let result = base.powf(exponent);

    if result.is_nan() {
        return Err(MathError::InvalidOperand(format!(
            "{}^{} is not a real number",
            base, exponent
        )));
    }
    if result.is_infinite() {
        let reason = if base == 0.0 && exponent < 0.0 {
            "zero cannot be raised to a negative power"
        } else {
            "result out of range"
        };
        return Err(MathError::InvalidOperand(format!(
            "{}^{}: {}",
            base, exponent, reason
        )));
    }

    Ok(result)
}

/// Compute the n-th Fibonacci number (`F(0) = 0`, `F(1) = 1`).
///
/// Iterative with two running terms; F(1000) has 209 digits.
///
/// # Errors
/// Returns [`MathError::OutOfRange`] if `n < 0` or `n > 1000`.
pub fn fibonacci(n: i64) -> Result<BigUint, MathError> {
    if n < 0 {
        return Err(MathError::OutOfRange(
            "Fibonacci position cannot be negative".to_string(),
        ));
    }
    if n > FIBONACCI_MAX_N {
        return Err(MathError::OutOfRange(format!(
            "Fibonacci position too large (max {})",
            FIBONACCI_MAX_N
        )));
    }

    let mut previous = BigUint::zero();
    let mut current = BigUint::one();
    if n == 0 {
        return Ok(previous);
    }

    for _ in 1..n {
        let next = &previous + &current;
        previous = std::mem::replace(&mut current, next);
    }

    Ok(current)
}

/// Compute `n!`.
///
/// # Errors
/// Returns [`MathError::OutOfRange`] if `n < 0` or `n > 100`.
pub fn factorial(n: i64) -> Result<BigUint, MathError> {
    if n < 0 {
        return Err(MathError::OutOfRange(
            "Factorial is not defined for negative numbers".to_string(),
        ));
    }
    if n > FACTORIAL_MAX_N {
        return Err(MathError::OutOfRange(format!(
            "Number too large for factorial calculation (max {})",
            FACTORIAL_MAX_N
        )));
    }

    let mut result = BigUint::one();
    for i in 2..=n as u64 {
        result *= i;
    }

    Ok(result)
}
