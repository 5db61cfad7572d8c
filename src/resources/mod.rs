//! Typed wrappers for the school resources served by the API.
//!
//! Every endpoint wraps its payload as `{"data": ...}`; list endpoints take
//! `limit`/`offset` plus resource-specific filters. Create and update calls
//! validate their form before anything is sent.

pub mod containers;
pub mod reports;
pub mod sensor_data;
pub mod students;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::client::RequestOptions;
use crate::models::RequestResult;

pub use containers::{Container, ContainerForm, ContainersApi, ContainersListResponse};
pub use reports::{Report, ReportFilters, ReportForm, ReportUpdate, ReportsApi, ReportsListResponse};
pub use sensor_data::{
    SensorData, SensorDataApi, SensorDataFilters, SensorDataForm, SensorDataListResponse,
    SensorDataUpdate,
};
pub use students::{Student, StudentForm, StudentsApi, StudentsListResponse};

/// Field name to human-readable problem.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The form was rejected locally; nothing was sent.
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    Api(String),
}

/// Paging shared by every list call. Zero values are not sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Page {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    pub(crate) fn apply(&self, options: RequestOptions) -> RequestOptions {
        let options = optional_query(options, "limit", self.limit.filter(|l| *l > 0));
        optional_query(options, "offset", self.offset.filter(|o| *o > 0))
    }
}

#[derive(Deserialize)]
pub(crate) struct Envelope<T> {
    data: T,
}

pub(crate) fn optional_query<V: ToString>(
    options: RequestOptions,
    key: &str,
    value: Option<V>,
) -> RequestOptions {
    match value {
        Some(value) => {
            let value = value.to_string();
            if value.is_empty() {
                options
            } else {
                options.query(key, value)
            }
        }
        None => options,
    }
}

/// Unwraps `{"data": T}`, substituting `fallback` for an empty error.
pub(crate) fn unwrap_envelope<T>(
    result: RequestResult<Envelope<T>>,
    fallback: &str,
) -> Result<T, ResourceError> {
    result
        .into_result()
        .map(|envelope| envelope.data)
        .map_err(|error| ResourceError::Api(non_empty_or(error, fallback)))
}

/// Outcome of a create/update/delete: the server's message, or `done` when
/// it sent none.
pub(crate) fn mutation_message(
    result: RequestResult<Value>,
    done: &str,
    fallback: &str,
) -> Result<String, ResourceError> {
    let message = result.message().map(str::to_string);
    match result.into_result() {
        Ok(_) => Ok(message.unwrap_or_else(|| done.to_string())),
        Err(error) => Err(ResourceError::Api(non_empty_or(error, fallback))),
    }
}

pub(crate) fn require(errors: &mut FieldErrors, field: &str, value: &str, problem: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), problem.to_string());
    }
}

pub(crate) fn check(errors: FieldErrors) -> Result<(), ResourceError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ResourceError::Validation(errors))
    }
}

fn non_empty_or(error: String, fallback: &str) -> String {
    if error.trim().is_empty() {
        fallback.to_string()
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_skips_zero_values() {
        let options = Page::new(10, 0).apply(RequestOptions::new());
        assert_eq!(options.query, vec![("limit".to_string(), "10".to_string())]);

        let options = Page::default().apply(RequestOptions::new());
        assert!(options.query.is_empty());
    }

    #[test]
    fn test_unwrap_envelope_uses_fallback_for_blank_error() {
        let result: RequestResult<Envelope<u8>> = RequestResult::failure("");
        assert_eq!(
            unwrap_envelope(result, "Failed to fetch students"),
            Err(ResourceError::Api("Failed to fetch students".to_string()))
        );
    }

    #[test]
    fn test_mutation_message_prefers_server_text() {
        let result = RequestResult::success(Value::Null, Some("Student created".to_string()));
        assert_eq!(
            mutation_message(result, "done", "failed"),
            Ok("Student created".to_string())
        );
        let result = RequestResult::success(Value::Null, None);
        assert_eq!(mutation_message(result, "done", "failed"), Ok("done".to_string()));
    }

    #[test]
    fn test_validation_error_display() {
        let mut errors = FieldErrors::new();
        require(&mut errors, "code", "  ", "Container code is required");
        let err = check(errors).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed");
    }
}
