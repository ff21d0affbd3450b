use chrono::NaiveDateTime;
use diesel::prelude::*;

use super::schema::calculations;
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{
    CalculationId, CalculationInput, CalculationRecord, CalculationResult, NewCalculation,
    Operation,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = calculations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CalculationRow {
    pub id: i64,
    pub operation: String,
    pub input_data: String,
    pub result: String,
    pub execution_time_ms: f64,
    pub timestamp: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = calculations)]
pub struct NewCalculationRow {
    pub operation: String,
    pub input_data: String,
    pub result: String,
    pub execution_time_ms: f64,
    pub timestamp: String,
}

impl From<&NewCalculation> for NewCalculationRow {
    fn from(calc: &NewCalculation) -> Self {
        Self {
            operation: calc.operation().as_str().to_string(),
            input_data: calc.input_data.to_json().to_string(),
            result: calc.result.to_storage_string(),
            execution_time_ms: calc.execution_time_ms,
            timestamp: calc.timestamp.clone(),
        }
    }
}

impl CalculationRow {
    /// Decode a stored row. Fails only if the table was written by something
    /// other than this service.
    pub fn into_record(self) -> RepositoryResult<CalculationRecord> {
        let id = self.id;
        let decode_error = move |message: String| {
            RepositoryError::internal_with_context(
                message,
                ErrorContext::new("decode_row")
                    .with_entity("calculation")
                    .with_entity_id(id),
            )
        };

        let operation: Operation = self.operation.parse().map_err(decode_error)?;
        let input_json: serde_json::Value = serde_json::from_str(&self.input_data)
            .map_err(|e| decode_error(format!("Failed to parse input_data JSON: {}", e)))?;
        let input_data = CalculationInput::from_json(operation, &input_json).map_err(decode_error)?;
        let result =
            CalculationResult::from_storage_string(operation, &self.result).map_err(decode_error)?;

        Ok(CalculationRecord {
            id: CalculationId::new(id),
            operation,
            input_data,
            result,
            execution_time_ms: self.execution_time_ms,
            timestamp: self.timestamp,
            created_at: self.created_at,
        })
    }
}
