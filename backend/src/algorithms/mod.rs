//! Pure numeric algorithms behind the calculation endpoints.

pub mod math;

pub use math::{factorial, fibonacci, power, MathError, FACTORIAL_MAX_N, FIBONACCI_MAX_N};
