//! Failures of the relay and their conversion into the JSON error envelope.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("invalid chat input: {0}")]
    InvalidInput(String),
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("origin not permitted")]
    OriginDenied,
    #[error("upstream API key is not configured")]
    ConfigurationError,
    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error talking to upstream: {0}")]
    NetworkError(String),
    #[error("upstream response is missing choices[0].message.content")]
    MalformedUpstreamResponse,
    #[error("upstream returned HTTP {status}: {details}")]
    UpstreamError { status: u16, details: String },
    #[error("internal error: {0}")]
    InternalError(String),
}

/// The body of every failed relay response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Upstream rejected the key held by this server. Not the caller's business.
fn is_credential_failure(status: u16) -> bool {
    matches!(status, 401 | 403)
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidJson(_) | RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::OriginDenied => StatusCode::FORBIDDEN,
            RelayError::ConfigurationError
            | RelayError::MalformedUpstreamResponse
            | RelayError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::NetworkError(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::UpstreamError { status, .. } if is_credential_failure(*status) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::UpstreamError { status, .. } if (400..600).contains(status) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::UpstreamError { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Machine readable code placed in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::InvalidJson(_) => "INVALID_JSON",
            RelayError::InvalidInput(_) => "INVALID_INPUT",
            RelayError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            RelayError::OriginDenied => "ORIGIN_DENIED",
            RelayError::ConfigurationError => "CONFIG_ERROR",
            RelayError::Timeout(_) => "UPSTREAM_TIMEOUT",
            RelayError::NetworkError(_) => "NETWORK_ERROR",
            RelayError::MalformedUpstreamResponse => "UPSTREAM_RESPONSE_MALFORMED",
            RelayError::UpstreamError { .. } => "UPSTREAM_API_ERROR",
            RelayError::InternalError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Builds the client-facing body. Transport errors, internal errors and rejected
    /// server credentials get a generic message only.
    pub fn body(&self) -> ErrorBody {
        let (message, details) = match self {
            RelayError::InvalidJson(reason) => (
                "Invalid JSON format in request body.".to_owned(),
                Some(reason.clone()),
            ),
            RelayError::InvalidInput(reason) => (reason.clone(), None),
            RelayError::PayloadTooLarge(limit) => (
                format!("Request body exceeds the {limit} byte limit."),
                None,
            ),
            RelayError::OriginDenied => ("Origin not permitted.".to_owned(), None),
            RelayError::ConfigurationError => (
                "Server configuration error: API key missing.".to_owned(),
                None,
            ),
            RelayError::Timeout(_) => (
                "The request to the AI service timed out.".to_owned(),
                None,
            ),
            RelayError::NetworkError(_) => (
                "Could not connect to the AI service.".to_owned(),
                None,
            ),
            RelayError::MalformedUpstreamResponse => (
                "Received unexpected response format from the AI service.".to_owned(),
                None,
            ),
            RelayError::UpstreamError { status, .. } if is_credential_failure(*status) => (
                "The AI service rejected the server's credentials.".to_owned(),
                None,
            ),
            RelayError::UpstreamError { status, details } => (
                format!("AI service error (HTTP {status})"),
                Some(details.clone()),
            ),
            RelayError::InternalError(_) => (
                "An unexpected server error occurred.".to_owned(),
                None,
            ),
        };

        ErrorBody {
            error: self.code(),
            message,
            details,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
