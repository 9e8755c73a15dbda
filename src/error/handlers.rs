//! Standardized status classification shared by every registry operation

use crate::error::{ApiError, ErrorKind, Result};
use crate::registry::transport::{RawResponse, TransportError};
use serde_json::Value;

/// A failure status an operation recognises, with its fixed message
#[derive(Debug, Clone, Copy)]
pub struct KnownFailure {
    pub status: u16,
    pub kind: ErrorKind,
    pub message: &'static str,
}

impl KnownFailure {
    pub const fn new(status: u16, kind: ErrorKind, message: &'static str) -> Self {
        Self {
            status,
            kind,
            message,
        }
    }
}

/// Success and failure statuses of one operation
#[derive(Debug, Clone, Copy)]
pub struct StatusPolicy {
    pub operation: &'static str,
    pub success: &'static [u16],
    pub failures: &'static [KnownFailure],
}

impl StatusPolicy {
    /// Turn a raw response into the parsed payload or the matching error.
    pub fn classify(&self, response: &RawResponse) -> Result<Value> {
        let status = response.status;
        if self.success.contains(&status) {
            return Ok(response.payload());
        }

        if let Some(failure) = self.failures.iter().find(|f| f.status == status) {
            tracing::debug!(operation = self.operation, status, "recognised failure status");
            return Err(failure.kind.at_status(status, failure.message));
        }

        tracing::warn!(operation = self.operation, status, "unrecognised response status");
        Err(ApiError::Unknown {
            status,
            detail: server_message(&response.payload()),
        })
    }
}

/// Extract a `message` field from an error body, if the server sent one.
fn server_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Network error categorization
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Format a reqwest failure with a short category prefix
    pub fn describe(error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!("request timed out: {}", error)
        } else if error.is_connect() {
            format!("connection error: {}", error)
        } else if error.is_body() || error.is_decode() {
            format!("failed to read response body: {}", error)
        } else if error.is_request() {
            format!("request could not be sent: {}", error)
        } else {
            format!("network error: {}", error)
        }
    }

    pub fn into_api_error(error: TransportError, operation: &str) -> ApiError {
        match error {
            TransportError::NoResponse(msg) => {
                tracing::warn!(operation, error = %msg, "request did not reach the server");
                ApiError::NoResponse(msg)
            }
            TransportError::InvalidHeader { name, reason } => {
                tracing::warn!(operation, header = %name, "request not sent: invalid header");
                ApiError::InvalidRequest(format!("header '{}' is not valid: {}", name, reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: StatusPolicy = StatusPolicy {
        operation: "get package",
        success: &[200],
        failures: &[
            KnownFailure::new(400, ErrorKind::Validation, "bad id"),
            KnownFailure::new(404, ErrorKind::NotFound, "Package does not exist."),
        ],
    };

    #[test]
    fn success_returns_body() {
        let response = RawResponse::new(200, br#"{"id":"abc"}"#.to_vec());
        let value = POLICY.classify(&response).unwrap();
        assert_eq!(value["id"], "abc");
    }

    #[test]
    fn known_failure_uses_fixed_message() {
        let response = RawResponse::new(404, b"{}".to_vec());
        let err = POLICY.classify(&response).unwrap_err();
        assert_eq!(err, ApiError::NotFound("Package does not exist.".to_string()));
    }

    #[test]
    fn unlisted_success_status_is_unknown() {
        let response = RawResponse::new(201, Vec::new());
        let err = POLICY.classify(&response).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.status(), Some(201));
    }

    #[test]
    fn unknown_status_keeps_server_message() {
        let response = RawResponse::new(418, br#"{"message":"teapot"}"#.to_vec());
        let err = POLICY.classify(&response).unwrap_err();
        assert_eq!(
            err,
            ApiError::Unknown {
                status: 418,
                detail: Some("teapot".to_string())
            }
        );
    }

    #[test]
    fn invalid_header_is_invalid_request_not_network_failure() {
        let err = NetworkErrorHandler::into_api_error(
            TransportError::InvalidHeader {
                name: "id".to_string(),
                reason: "value must be visible ASCII".to_string(),
            },
            "update package",
        );
        assert_eq!(
            err,
            ApiError::InvalidRequest("header 'id' is not valid: value must be visible ASCII".to_string())
        );
        assert_eq!(err.status(), None);
    }
}
