//! Error types for registry API operations
//!
//! Every operation returns [`ApiError`], a fixed taxonomy of failures the
//! calling layer can display. Raw transport errors are folded into
//! [`ApiError::NoResponse`] before they leave the crate.

pub mod handlers;

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Message used for every 403 response.
pub const AUTH_TOKEN_REJECTED: &str =
    "Authentication failed due to invalid or missing AuthenticationToken.";

/// Discriminant of [`ApiError`], used by status tables and callers that only
/// care about the category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    AuthInvalid,
    AuthExpiredOrMissing,
    NotFound,
    Conflict,
    PayloadTooLarge,
    BusinessRejected,
    ServerFault,
    Unsupported,
    NoResponse,
    Unknown,
    UnexpectedPayload,
    InvalidRequest,
}

impl ErrorKind {
    /// Build the error observed with `status`. `Unknown` keeps that status;
    /// kinds without an HTTP status ignore it.
    pub fn at_status(self, status: u16, message: impl Into<String>) -> ApiError {
        let message = message.into();
        match self {
            ErrorKind::Validation => ApiError::Validation(message),
            ErrorKind::AuthInvalid => ApiError::AuthInvalid(message),
            ErrorKind::AuthExpiredOrMissing => ApiError::AuthExpiredOrMissing(message),
            ErrorKind::NotFound => ApiError::NotFound(message),
            ErrorKind::Conflict => ApiError::Conflict(message),
            ErrorKind::PayloadTooLarge => ApiError::PayloadTooLarge(message),
            ErrorKind::BusinessRejected => ApiError::BusinessRejected(message),
            ErrorKind::ServerFault => ApiError::ServerFault(message),
            ErrorKind::Unsupported => ApiError::Unsupported(message),
            ErrorKind::NoResponse => ApiError::NoResponse(message),
            ErrorKind::UnexpectedPayload => ApiError::UnexpectedPayload(message),
            ErrorKind::InvalidRequest => ApiError::InvalidRequest(message),
            ErrorKind::Unknown => ApiError::Unknown {
                status,
                detail: Some(message),
            },
        }
    }
}

/// Classified failure of a registry operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Malformed or missing fields (400)
    #[error("{0}")]
    Validation(String),
    /// Bad credentials or insufficient rights (401)
    #[error("{0}")]
    AuthInvalid(String),
    /// Token missing, invalid or expired (403)
    #[error("{0}")]
    AuthExpiredOrMissing(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    /// Request understood but refused by a business rule (424)
    #[error("{0}")]
    BusinessRejected(String),
    #[error("{0}")]
    ServerFault(String),
    #[error("{0}")]
    Unsupported(String),
    /// The request never produced a response
    #[error("No response received from the server: {0}")]
    NoResponse(String),
    /// Status outside the operation's documented set
    #[error("An unknown error occurred. Status: {status}{}", detail_suffix(.detail))]
    Unknown { status: u16, detail: Option<String> },
    /// Success status whose body does not have the documented shape
    #[error("Unexpected response payload: {0}")]
    UnexpectedPayload(String),
    /// The request could not be built, so nothing was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(". Message: {}", detail),
        None => String::new(),
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::AuthInvalid(_) => ErrorKind::AuthInvalid,
            ApiError::AuthExpiredOrMissing(_) => ErrorKind::AuthExpiredOrMissing,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Conflict(_) => ErrorKind::Conflict,
            ApiError::PayloadTooLarge(_) => ErrorKind::PayloadTooLarge,
            ApiError::BusinessRejected(_) => ErrorKind::BusinessRejected,
            ApiError::ServerFault(_) => ErrorKind::ServerFault,
            ApiError::Unsupported(_) => ErrorKind::Unsupported,
            ApiError::NoResponse(_) => ErrorKind::NoResponse,
            ApiError::Unknown { .. } => ErrorKind::Unknown,
            ApiError::UnexpectedPayload(_) => ErrorKind::UnexpectedPayload,
            ApiError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// HTTP status this error was classified from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation(_) => Some(400),
            ApiError::AuthInvalid(_) => Some(401),
            ApiError::AuthExpiredOrMissing(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Conflict(_) => Some(409),
            ApiError::PayloadTooLarge(_) => Some(413),
            ApiError::BusinessRejected(_) => Some(424),
            ApiError::ServerFault(_) => Some(500),
            ApiError::Unsupported(_) => Some(501),
            ApiError::Unknown { status, .. } => Some(*status),
            ApiError::NoResponse(_)
            | ApiError::UnexpectedPayload(_)
            | ApiError::InvalidRequest(_) => None,
        }
    }

    /// True when the server rejected the session token.
    pub fn is_session_rejected(&self) -> bool {
        matches!(self, ApiError::AuthExpiredOrMissing(_))
    }
}

/// Invalid client configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
    #[error("Configuration error: {0}")]
    Invalid(String),
}

/// Failure of the token persistence backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session file error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Session file {} is not valid JSON: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Session storage lock poisoned")]
    Poisoned,
}

/// Failure of a command-line invocation
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid arguments: {0}")]
    Arguments(String),
    #[error("Failed to read {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    /// Process exit code: 2 for usage problems, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Arguments(_) | CliError::Config(_) => 2,
            CliError::Api(_) | CliError::Input { .. } => 1,
        }
    }
}
