// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use crate::error::SupervisorError;
use crate::protocol::ErrorBody;

/// Error response: a status code and a `{"detail": ...}` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<SupervisorError> for ApiError {
    fn from(err: SupervisorError) -> Self {
        let status = match &err {
            SupervisorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SupervisorError::Conflict { .. } => StatusCode::CONFLICT,
            SupervisorError::LaunchFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            SupervisorError::NotFound { .. } => StatusCode::NOT_FOUND,
            SupervisorError::Aborted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, detail = %self.detail, "request failed");
        }
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
