//! Request and response envelopes for the relay API.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use sift_core::{AnalysisError, AnalysisResult, ProviderKind, UsageSnapshot};

/// Error codes carried in the `code` field of error envelopes.
pub mod error_codes {
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
}

/// POST /ask body.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub status: u16,
    pub data: AnalysisResult,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub status: u16,
    /// One result per provider, in `models` order; failed providers are all-null
    pub datas: Vec<AnalysisResult>,
    pub models: Vec<ProviderKind>,
}

#[derive(Debug, Serialize)]
pub struct AskData {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub status: u16,
    pub data: AskData,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: u16,
    pub models: Vec<ProviderKind>,
    pub version: String,
    pub requests: UsageSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub code: String,
}

/// An error rendered as `{status, error, code}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: error_codes::INVALID_REQUEST,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            code: error_codes::RATE_LIMITED,
            message: format!("Too many requests, retry in {retry_after_secs}s"),
            retry_after: Some(retry_after_secs),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Request failed: {err}");
        }
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
            retry_after: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            status: self.status.as_u16(),
            error: self.message,
            code: self.code.to_string(),
        });
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
