//! Body and query-string extraction that reports failures as [`AppError`].
//!
//! Handlers take `Result<Json<T>, JsonRejection>` (or the `Query` equivalent) and
//! unwrap it here, so a malformed request gets the same `{"message": ...}` body as
//! every other error.

use axum::{
    Json,
    extract::{
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
};

use crate::error::AppError;

/// Unwraps a JSON body, keeping the rejection's status (400, 415 or 422).
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidRequest {
            status: rejection.status(),
            detail: rejection.body_text(),
        })
}

/// Unwraps a query string, keeping the rejection's status.
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::InvalidRequest {
            status: rejection.status(),
            detail: rejection.body_text(),
        })
}
