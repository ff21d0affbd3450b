//! Recurrence properties of the calculation engine.

use num_bigint::BigUint;
use proptest::prelude::*;

use math_service::algorithms::{
    factorial, fibonacci, power, FACTORIAL_MAX_N, FIBONACCI_MAX_N,
};

proptest! {
    #[test]
    fn fibonacci_satisfies_recurrence(n in 2i64..=FIBONACCI_MAX_N) {
        let expected = fibonacci(n - 1).unwrap() + fibonacci(n - 2).unwrap();
        prop_assert_eq!(fibonacci(n).unwrap(), expected);
    }

    #[test]
    fn factorial_satisfies_recurrence(n in 1i64..=FACTORIAL_MAX_N) {
        let expected = factorial(n - 1).unwrap() * BigUint::from(n as u64);
        prop_assert_eq!(factorial(n).unwrap(), expected);
    }

    #[test]
    fn negative_inputs_are_rejected(n in i64::MIN..0) {
        prop_assert!(fibonacci(n).is_err());
        prop_assert!(factorial(n).is_err());
    }

    #[test]
    fn integer_powers_match_repeated_multiplication(base in -20i32..=20, exponent in 0i32..=10) {
        let expected = (0..exponent).fold(1.0f64, |acc, _| acc * base as f64);
        prop_assert_eq!(power(base as f64, exponent as f64).unwrap(), expected);
    }
}

#[test]
fn boundaries() {
    assert_eq!(fibonacci(0).unwrap(), BigUint::from(0u32));
    assert_eq!(fibonacci(1).unwrap(), BigUint::from(1u32));
    assert_eq!(factorial(0).unwrap(), BigUint::from(1u32));
    assert!(fibonacci(FIBONACCI_MAX_N + 1).is_err());
    assert!(factorial(FACTORIAL_MAX_N + 1).is_err());
    assert_eq!(power(2.0, 3.0).unwrap(), 8.0);
}
