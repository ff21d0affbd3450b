//! Calculation records and the values they carry.
//!
//! A record is written once per successful calculation and never mutated.
//! The same types travel through the pipeline, the repositories and the HTTP
//! envelopes, so everything here derives `Serialize`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize, Serializer};

/// Calculation identifier (database primary key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CalculationId(pub i64);

impl CalculationId {
    pub fn new(value: i64) -> Self {
        CalculationId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CalculationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CalculationId {
    fn from(value: i64) -> Self {
        CalculationId(value)
    }
}

/// The closed set of supported operations.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Power,
    Fibonacci,
    Factorial,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Power, Operation::Fibonacci, Operation::Factorial];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Power => "power",
            Operation::Fibonacci => "fibonacci",
            Operation::Factorial => "factorial",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "power" => Ok(Operation::Power),
            "fibonacci" => Ok(Operation::Fibonacci),
            "factorial" => Ok(Operation::Factorial),
            other => Err(format!("Unknown operation: {}", other)),
        }
    }
}

/// Parameters for `power`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerInput {
    pub base: f64,
    pub exponent: f64,
}

/// Parameter for `fibonacci` and `factorial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceInput {
    pub n: i64,
}

/// Validated input of one calculation.
///
/// Serializes as the bare parameter map (`{"base", "exponent"}` or `{"n"}`);
/// the operation name is carried next to it, never inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalculationInput {
    Power(PowerInput),
    Fibonacci(SequenceInput),
    Factorial(SequenceInput),
}

impl CalculationInput {
    pub fn operation(&self) -> Operation {
        match self {
            CalculationInput::Power(_) => Operation::Power,
            CalculationInput::Fibonacci(_) => Operation::Fibonacci,
            CalculationInput::Factorial(_) => Operation::Factorial,
        }
    }

    /// Rebuild an input from its stored JSON parameter map.
    pub fn from_json(operation: Operation, value: &serde_json::Value) -> Result<Self, String> {
        let parsed = match operation {
            Operation::Power => serde_json::from_value(value.clone()).map(CalculationInput::Power),
            Operation::Fibonacci => {
                serde_json::from_value(value.clone()).map(CalculationInput::Fibonacci)
            }
            Operation::Factorial => {
                serde_json::from_value(value.clone()).map(CalculationInput::Factorial)
            }
        };
        parsed.map_err(|e| format!("Invalid {} input data: {}", operation, e))
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CalculationInput::Power(p) => serde_json::json!({ "base": p.base, "exponent": p.exponent }),
            CalculationInput::Fibonacci(s) | CalculationInput::Factorial(s) => {
                serde_json::json!({ "n": s.n })
            }
        }
    }
}

impl Serialize for CalculationInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CalculationInput::Power(p) => p.serialize(serializer),
            CalculationInput::Fibonacci(s) | CalculationInput::Factorial(s) => {
                s.serialize(serializer)
            }
        }
    }
}

/// Outcome of a calculation.
///
/// Power yields a float; the sequence operations yield exact integers that
/// may be hundreds of digits long.
#[derive(Debug, Clone, PartialEq)]
pub enum CalculationResult {
    Float(f64),
    Integer(BigUint),
}

impl CalculationResult {
    /// Exact decimal text used for storage.
    pub fn to_storage_string(&self) -> String {
        match self {
            CalculationResult::Float(v) => format!("{:?}", v),
            CalculationResult::Integer(v) => v.to_string(),
        }
    }

    /// Parse the stored text back, using the operation to pick the variant.
    pub fn from_storage_string(operation: Operation, raw: &str) -> Result<Self, String> {
        match operation {
            Operation::Power => raw
                .parse::<f64>()
                .map(CalculationResult::Float)
                .map_err(|e| format!("Invalid power result '{}': {}", raw, e)),
            Operation::Fibonacci | Operation::Factorial => raw
                .parse::<BigUint>()
                .map(CalculationResult::Integer)
                .map_err(|e| format!("Invalid {} result '{}': {}", operation, raw, e)),
        }
    }
}

impl fmt::Display for CalculationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationResult::Float(v) => write!(f, "{}", v),
            CalculationResult::Integer(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for CalculationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CalculationResult::Float(v) => serializer.serialize_f64(*v),
            CalculationResult::Integer(v) => {
                // Digits only, so this never fails; the fallback keeps the type honest.
                match serde_json::Number::from_str(&v.to_string()) {
                    Ok(number) => number.serialize(serializer),
                    Err(_) => serializer.serialize_str(&v.to_string()),
                }
            }
        }
    }
}

/// A calculation ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCalculation {
    pub input_data: CalculationInput,
    pub result: CalculationResult,
    pub execution_time_ms: f64,
    pub timestamp: String,
}

impl NewCalculation {
    pub fn operation(&self) -> Operation {
        self.input_data.operation()
    }
}

/// A persisted calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationRecord {
    pub id: CalculationId,
    pub operation: Operation,
    pub input_data: CalculationInput,
    pub result: CalculationResult,
    pub execution_time_ms: f64,
    pub timestamp: String,
    pub created_at: NaiveDateTime,
}

impl CalculationRecord {
    pub fn from_new(id: CalculationId, new: NewCalculation, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            operation: new.operation(),
            input_data: new.input_data,
            result: new.result,
            execution_time_ms: new.execution_time_ms,
            timestamp: new.timestamp,
            created_at,
        }
    }
}

/// Aggregate usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalculationStats {
    pub total_calculations: u64,
    pub operations_count: BTreeMap<Operation, u64>,
    pub average_execution_times: BTreeMap<Operation, f64>,
}
