//! Error taxonomy and JSON error responses for the API

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use serde::Serialize;
use thiserror::Error;

/// Request failures, mapped to HTTP status codes at the boundary
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request data
    #[error("{0}")]
    Validation(String),
    /// No authenticated session
    #[error("unauthorized")]
    Unauthorized,
    /// Unknown record id or path
    #[error("{0}")]
    NotFound(String),
    /// Too many login attempts from one client
    #[error("Too many login attempts, please try again later")]
    RateLimited,
    /// Database or file-system failure; detail is logged, not exposed
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to send to the client
    pub fn public_message(&self) -> String {
        match self {
            // Internal detail stays server-side
            ApiError::Internal(_) => "Unexpected server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// JSON error body, matching the `{"error": "..."}` wire shape
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Build a JSON error response for an [`ApiError`]
pub fn error_response(err: &ApiError) -> Response<Full<Bytes>> {
    json_error(err.status_code(), err.public_message())
}

/// Build a JSON error response with an explicit status
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response<Full<Bytes>> {
    let body = ErrorBody {
        error: message.into(),
    };
    let json = serde_json::to_string(&body)
        .unwrap_or_else(|_| r#"{"error":"Unexpected server error"}"#.to_string());

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .expect("valid response with static headers")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Validation("name is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::NotFound("app not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("disk on fire")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = ApiError::Internal(anyhow::anyhow!("sqlite: database is locked"));
        assert_eq!(err.public_message(), "Unexpected server error");
    }

    #[test]
    fn test_validation_message_exposed() {
        let err = ApiError::Validation("Invalid URL format".into());
        assert_eq!(err.public_message(), "Invalid URL format");
    }

    #[test]
    fn test_error_response_shape() {
        let response = error_response(&ApiError::NotFound("app not found".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
