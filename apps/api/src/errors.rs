use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::documents::ExtractionError;
use crate::interview::validation::{describe_missing, MissingField};
use crate::interview::InterviewError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing fields: {}", describe_missing(.0))]
    MissingFields(Vec<MissingField>),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<InterviewError> for AppError {
    fn from(e: InterviewError) -> Self {
        match e {
            InterviewError::Extraction(ExtractionError::UnsupportedFormat) => {
                AppError::UnsupportedMediaType(e.to_string())
            }
            InterviewError::Extraction(ExtractionError::TooLarge { .. }) => {
                AppError::PayloadTooLarge(e.to_string())
            }
            InterviewError::Extraction(_) => AppError::UnprocessableEntity(e.to_string()),
            InterviewError::Validation { missing_fields } => AppError::MissingFields(missing_fields),
            InterviewError::EmptyAnswer => AppError::Validation(e.to_string()),
            InterviewError::Evaluation(ref inner) => AppError::Llm(inner.message.clone()),
            InterviewError::NothingToResume => AppError::NotFound(e.to_string()),
            InterviewError::InvalidSnapshot(_) => AppError::UnprocessableEntity(e.to_string()),
            InterviewError::InvalidPhase { .. }
            | InterviewError::Busy
            | InterviewError::NoActiveQuestion
            | InterviewError::Superseded => AppError::Conflict(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MissingFields(fields) => {
                let body = Json(json!({
                    "error": {
                        "code": "MISSING_FIELDS",
                        "message": format!("Please fill in the missing fields: {}", describe_missing(fields)),
                        "missing_fields": fields,
                    }
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg.clone(),
            ),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "EVALUATION_FAILED",
                    "Failed to evaluate answer. Please try submitting again.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
