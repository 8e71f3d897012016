use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::problem::ProblemResponse;

/// Detail returned for every storage failure. Internal error text stays in the logs.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal server error";

/// Outcome taxonomy shared by the company and dividend services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("resource not found")]
    NotFound(Option<String>),
    #[error("storage failure while {context}")]
    Storage { context: &'static str },
    #[error("{0}")]
    Unexpected(&'static str),
}

impl ServiceError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound(Some(detail.into()))
    }

    /// Short label used for the `result` dimension of request metrics.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid",
            Self::NotFound(_) => "not_found",
            Self::Storage { .. } | Self::Unexpected(_) => "error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage { .. } | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(detail) => ProblemResponse::bad_request(detail).into_response(),
            Self::NotFound(None) => StatusCode::NOT_FOUND.into_response(),
            Self::NotFound(Some(detail)) => ProblemResponse::not_found(detail).into_response(),
            Self::Storage { .. } => {
                ProblemResponse::internal("storage_failure", INTERNAL_ERROR_DETAIL).into_response()
            }
            Self::Unexpected(detail) => {
                ProblemResponse::internal("operation_failed", detail).into_response()
            }
        }
    }
}

/// Failure boundary around a store call: logs the full error and hands back
/// an opaque [`ServiceError::Storage`].
pub fn storage_failure<E>(context: &'static str) -> impl FnOnce(E) -> ServiceError
where
    E: std::error::Error,
{
    move |err| {
        error!(stage = "api", error = %err, "error occurred while {}", context);
        ServiceError::Storage { context }
    }
}

/// Unwraps a JSON body, turning malformed or missing payloads into a 400.
pub fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    detail: &'static str,
) -> Result<T, ServiceError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!(stage = "api", reason = %rejection.body_text(), "rejected request body");
            Err(ServiceError::validation(detail))
        }
    }
}

/// Unwraps an integer path segment, turning non-numeric ids into a 400.
pub fn path_id(
    path: Result<Path<i64>, PathRejection>,
    detail: &'static str,
) -> Result<i64, ServiceError> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            warn!(stage = "api", reason = %rejection.body_text(), "rejected path parameter");
            Err(ServiceError::validation(detail))
        }
    }
}
