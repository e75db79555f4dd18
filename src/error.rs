use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::ellipsize;

/// Error body returned by every endpoint on failure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Failure kinds a grading request can end in
#[derive(Debug, Error)]
pub enum GradingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream rejected credentials: {0}")]
    UpstreamAuth(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("model reply could not be parsed: {0}")]
    Parse(String),

    #[error("no usable presentation content: {0}")]
    Extraction(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GradingError {
    pub fn code(&self) -> &'static str {
        match self {
            GradingError::InvalidInput(_) => "INVALID_INPUT",
            GradingError::UpstreamAuth(_) => "UPSTREAM_AUTH_ERROR",
            GradingError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            GradingError::Parse(_) => "PARSE_ERROR",
            GradingError::Extraction(_) => "EXTRACTION_ERROR",
            GradingError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GradingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GradingError::UpstreamAuth(_) | GradingError::Parse(_) => StatusCode::BAD_GATEWAY,
            GradingError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GradingError::Extraction(_) | GradingError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            GradingError::InvalidInput(msg) => msg.clone(),
            GradingError::UpstreamAuth(_) => "An upstream service rejected our credentials".into(),
            GradingError::UpstreamUnavailable(_) => "An upstream service is unavailable".into(),
            GradingError::Parse(_) => "An evaluator returned an unexpected reply".into(),
            GradingError::Extraction(_) => {
                "No reviewable content could be extracted from the presentation".into()
            }
            GradingError::Internal(_) => "An unexpected error occurred".into(),
        }
    }
}

impl IntoResponse for GradingError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "Grading failed: {}", self);
        }

        let body = ErrorBody {
            code: self.code().to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Failure talking to GitHub, the language model or the search API
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{service} rejected credentials ({status})")]
    Auth { service: &'static str, status: u16 },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} response could not be decoded: {detail}")]
    Decode { service: &'static str, detail: String },
}

impl UpstreamError {
    pub fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| UpstreamError::Transport { service, source }
    }

    /// Pass 2xx responses through, turn everything else into an error
    pub async fn check(
        service: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, UpstreamError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(UpstreamError::Auth {
                service,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(UpstreamError::Status {
            service,
            status: status.as_u16(),
            body: ellipsize(&body, 512),
        })
    }
}

impl From<UpstreamError> for GradingError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Auth { .. } => GradingError::UpstreamAuth(err.to_string()),
            _ => GradingError::UpstreamUnavailable(err.to_string()),
        }
    }
}
