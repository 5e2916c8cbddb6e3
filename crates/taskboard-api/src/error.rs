use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use taskboard_types::api::ErrorResponse;

/// Every failure a request can end in. Missing and foreign resources are
/// both `NotFound`, so callers cannot probe for ids they do not own.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid data")]
    InvalidInput,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::InvalidInput => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        ApiError::InvalidInput
    }
}

/// Flask-style `<int:id>` routes: an id that does not parse names no resource.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        warn!("Rejected path: {}", rejection.body_text());
        ApiError::NotFound("Resource")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// A required text field: missing and empty are both invalid.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            warn!("Missing or empty field '{}'", field);
            Err(ApiError::InvalidInput)
        }
    }
}

/// `completed` is a boolean stored as an integer; only 0 and 1 are accepted.
pub(crate) fn completed_flag(value: i64) -> Result<i64, ApiError> {
    match value {
        0 | 1 => Ok(value),
        other => {
            warn!("Invalid completed flag {}", other);
            Err(ApiError::InvalidInput)
        }
    }
}
