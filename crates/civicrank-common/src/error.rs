use std::path::PathBuf;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failures raised anywhere between loading a dataset and emitting a ranking.
/// None of them are recovered locally; the run or request aborts.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("artifact not found or unreadable: {}", path.display())]
    MissingArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid artifact {}: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("input dataset not found: {}", path.display())]
    MissingInputFile { path: PathBuf },

    #[error("column `{column}` missing from {}", path.display())]
    SchemaMismatch { column: String, path: PathBuf },

    #[error("invalid value {value:?} in column `{column}` at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("feature vector has {actual} values, model expects {expected}")]
    FeatureWidth { expected: usize, actual: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::MissingArtifact { .. } => "missing_artifact",
            PipelineError::InvalidArtifact { .. } => "invalid_artifact",
            PipelineError::MissingInputFile { .. } => "missing_input_file",
            PipelineError::SchemaMismatch { .. } => "schema_mismatch",
            PipelineError::InvalidValue { .. } => "invalid_value",
            PipelineError::FeatureWidth { .. } => "feature_width",
            PipelineError::Csv(_) => "csv_error",
            PipelineError::Io(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type returned by every HTTP handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    details: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Pipeline(err) => err.code(),
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        error!(code, status = %status, error = %self, "api_error");

        let body = Json(ErrorBody {
            error: code,
            details: self.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
