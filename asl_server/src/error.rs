//! Errors of the frame pipeline and the HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::ErrorResp;
use thiserror::Error;

/// Failure while turning a posted frame into a letter.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to decode base64 image: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("hand detection failed: {0}")]
    Detection(#[source] anyhow::Error),

    #[error("classification failed: {0}")]
    Classification(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure of an HTTP request, rendered as `{ "error": "..." }`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No image provided")]
    MissingImage,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("frame processing aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingImage => StatusCode::BAD_REQUEST,
            Self::Pipeline(_) | Self::Aborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::warn!("Failed to process frame: {}", self);
        }

        let body = ErrorResp {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MissingImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingImage.to_string(), "No image provided");

        let err = ApiError::from(PipelineError::Classification(anyhow::anyhow!("bad tensor")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "classification failed: bad tensor");
    }
}
