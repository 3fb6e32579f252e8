//! Mapping of pipeline failures to HTTP responses.

use crate::error::PipelineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::Auth => StatusCode::UNAUTHORIZED,
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::Merge(_)
            | PipelineError::Publish(_)
            | PipelineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Merge and publish failures name their
    /// stage; storage failures stay generic.
    pub fn public_message(&self) -> String {
        match self {
            PipelineError::Auth => self.to_string(),
            PipelineError::Validation(e) => e.to_string(),
            PipelineError::Merge(e) => format!("Failed to merge video and audio: {}", e),
            PipelineError::Publish(e) => format!("Failed to publish merged video: {}", e),
            PipelineError::Storage(_) => String::from("Internal server error"),
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        if let PipelineError::Storage(e) = &self {
            tracing::error!(error = %e, "storage failure");
        }
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}
