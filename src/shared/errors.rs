use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// A single field-scoped validation failure. `code` mirrors the message
/// keys used by the web layer for display (`missing_campaign_name`,
/// `dates_not_in_sequence`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: &'static str,
}

/// Collects validation failures per field so a save reports all of them
/// together instead of aborting on the first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, code: &'static str) {
        self.errors.push(FieldError { field, code });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn on(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{what} not found")).into_response()
            }
            ApiError::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
            }
            ApiError::Database(e) => {
                log::error!("database error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")).into_response()
            }
            ApiError::Pool(e) => {
                log::error!("pool error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_multiple_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("first_name", "missing_first_name");
        errors.add("last_name", "missing_last_name");
        assert_eq!(errors.errors.len(), 2);
        assert!(errors.on("first_name").is_some());
        assert!(errors.on("email").is_none());
    }

    #[test]
    fn empty_collector_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn non_empty_collector_is_validation_error() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "missing_campaign_name");
        match errors.into_result() {
            Err(ApiError::Validation(e)) => assert_eq!(e.errors[0].code, "missing_campaign_name"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
