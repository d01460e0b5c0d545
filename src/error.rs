use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, provider::ProviderError, quiz::schema::SchemaError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Requested resource was not found.
    #[error("{0}")]
    NotFound(String),
    /// The content provider could not be reached or refused the call.
    #[error("content provider failure")]
    Provider(#[source] ProviderError),
    /// The content provider answered with unusable content.
    #[error("content provider returned malformed content")]
    Schema(#[source] SchemaError),
    /// A duplicate-hash insert lost the race and the winning row could not be read back.
    #[error("failed to retrieve game after conflict")]
    ConflictResolution,
    /// A write collided with a unique constraint owned by another record.
    #[error("{0}")]
    Conflict(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Schema(schema) => ServiceError::Schema(schema),
            other => ServiceError::Provider(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// Admin gate rejected the request.
    #[error("{0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Conflict with an existing record.
    #[error("{0}")]
    Conflict(String),
    /// Upstream answered with something unusable.
    #[error("{0}")]
    BadGateway(String),
    /// Service unavailable or degraded.
    #[error("{0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => {
                error!(error = %source, "storage failure");
                AppError::ServiceUnavailable("Storage unavailable".into())
            }
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Provider(source) => {
                AppError::ServiceUnavailable(format!("AI generation failed: {source}"))
            }
            ServiceError::Schema(source) => {
                AppError::BadGateway(format!("AI returned invalid content: {source}"))
            }
            ServiceError::ConflictResolution => {
                AppError::Internal("Failed to retrieve game after conflict".into())
            }
            ServiceError::Conflict(message) => AppError::Conflict(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl AppError {
    /// HTTP status this error is rendered with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            detail: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).status()
    }

    #[test]
    fn service_errors_map_to_http_statuses() {
        assert_eq!(
            status_of(ServiceError::NotFound("Game not found".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ProviderError::Timeout.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ProviderError::NotConfigured.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(
                ProviderError::Schema(SchemaError::WrongAnswerArity {
                    path: "$.questions[0]".into(),
                    found: 2,
                })
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ServiceError::ConflictResolution),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ServiceError::Conflict("taken".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(StorageError::DuplicateKey { key: "name" }.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn not_found_detail_is_the_bare_message() {
        let err = AppError::from(ServiceError::NotFound("Game not found".into()));
        assert_eq!(err.to_string(), "Game not found");
    }
}
