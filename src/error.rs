use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::llm::LlmError;

/// Everything that can go wrong between receiving a request and producing a
/// typed response.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Requested {requested} chapters, at most {max} are supported")]
    TooManyChapters { requested: usize, max: usize },

    #[error("Failed to parse AI response into valid JSON format")]
    UnparseableResponse,

    #[error("AI response is not a JSON object")]
    NotAnObject,

    #[error("AI response missing required field: {0}")]
    MissingField(&'static str),

    #[error("AI response field {field} is not {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

/// Error surfaced to HTTP callers. Every failure maps to a 500; only the
/// message tells causes apart.
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn book_plan(err: GenerationError) -> Self {
        Self {
            message: format!("Failed to generate book plan: {}", err),
        }
    }

    pub fn chapter(err: GenerationError) -> Self {
        Self {
            message: format!("Failed to generate chapter content: {}", err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.message, "Generation request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}
