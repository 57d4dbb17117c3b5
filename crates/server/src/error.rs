use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::validation::ValidationError;
use services::services::{
    board_data::BoardDataError,
    demo::DemoError,
    filter::FilterError,
    friendly_errors::{DbErrorKind, Feature, classify},
    storage::StorageError,
    time_tracking::TimerError,
};
use thiserror::Error;
use utils::response::ApiResponse;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    /// A database call with the user-facing operation it belongs to.
    #[error("Failed to {operation}")]
    Operation {
        operation: &'static str,
        feature: Option<Feature>,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    BoardData(#[from] BoardDataError),
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Demo(#[from] DemoError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Attach the operation name (and optionally the feature table) to a database result.
pub trait DbResultExt<T> {
    fn failed_to(self, operation: &'static str) -> Result<T, ApiError>;
    fn feature_failed_to(self, feature: Feature, operation: &'static str) -> Result<T, ApiError>;
}

impl<T> DbResultExt<T> for Result<T, sqlx::Error> {
    fn failed_to(self, operation: &'static str) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::Operation {
            operation,
            feature: None,
            source,
        })
    }

    fn feature_failed_to(self, feature: Feature, operation: &'static str) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::Operation {
            operation,
            feature: Some(feature),
            source,
        })
    }
}

fn database_response(
    err: &sqlx::Error,
    operation: Option<&str>,
    feature: Option<Feature>,
) -> (StatusCode, String) {
    let failed = || match operation {
        Some(op) => format!("Failed to {op}"),
        None => "Database error".to_string(),
    };
    match classify(err) {
        DbErrorKind::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        DbErrorKind::MissingTable => match feature {
            Some(feature) => {
                tracing::warn!(%feature, "Table missing: {}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    feature.requires_migration_message(),
                )
            }
            None => {
                tracing::error!("Table missing: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, failed())
            }
        },
        DbErrorKind::UniqueViolation => (StatusCode::CONFLICT, failed()),
        DbErrorKind::ForeignKeyViolation | DbErrorKind::CheckViolation => {
            (StatusCode::BAD_REQUEST, failed())
        }
        DbErrorKind::Other => {
            tracing::error!(operation = operation.unwrap_or("query"), "Database error: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, failed())
        }
    }
}

impl ApiError {
    /// Status code and the message shown to the user.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Database(e) => database_response(e, None, None),
            ApiError::Operation {
                operation,
                feature,
                source,
            } => database_response(source, Some(operation), *feature),
            ApiError::BoardData(BoardDataError::BoardNotFound) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::BoardData(BoardDataError::Database(e)) => {
                database_response(e, Some("load the board"), None)
            }
            ApiError::Timer(TimerError::AlreadyRunning { .. }) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            ApiError::Timer(TimerError::NotFound) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Timer(TimerError::Database(e)) => {
                database_response(e, Some("track time"), Some(Feature::TimeTracking))
            }
            ApiError::Storage(StorageError::InvalidKey) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Storage(StorageError::NotFound) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Storage(StorageError::Io(e)) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to access attachment storage".to_string(),
                )
            }
            ApiError::Demo(DemoError::ColumnFull { .. }) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            ApiError::Demo(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Filter(_) | ApiError::Validation(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Auth(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Multipart(e) => (e.status(), e.body_text()),
            ApiError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, message) = self.status_and_message();
        let response = ApiResponse::<()>::error(&message);
        (status_code, Json(response)).into_response()
    }
}
