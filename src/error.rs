use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::envelope::Envelope;
use crate::tmdb::TmdbError;

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again later.";

/// Request-level failure. Every variant turns into an error envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input; no upstream call was made.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// TMDB could not be reached or answered badly.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TmdbError> for ApiError {
    fn from(err: TmdbError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(_) => {
                tracing::error!("Request failed: {}", self);
            }
            // Already logged with context where the TMDB call failed.
            ApiError::Upstream(_) => {
                tracing::debug!("Reporting upstream failure: {}", self);
            }
            ApiError::NotFound(_) => {
                tracing::info!("Not found: {}", self);
            }
            ApiError::Validation(_) | ApiError::MethodNotAllowed => {
                tracing::debug!("Rejected request: {}", self);
            }
        }
        let status = self.status_code();
        (status, Json(Envelope::<()>::failure(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_kind_to_its_status() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::Upstream("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_errors_keep_their_message() {
        let err: ApiError = TmdbError::Status {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "TMDB responded with status 503: Service Unavailable"
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
