//! Authentication and user registration
//!
//! `authenticate` is the only way a session starts: on success the returned
//! token is handed to the [`SessionContext`](crate::session::SessionContext),
//! which persists it and re-arms expiry handling.

use crate::error::handlers::{KnownFailure, StatusPolicy};
use crate::error::{AUTH_TOKEN_REJECTED, ApiError, ErrorKind, Result};
use crate::registry::operations::OperationContext;
use crate::registry::transport::ApiRequest;
use serde::Serialize;
use serde_json::Value;

const REGISTER: StatusPolicy = StatusPolicy {
    operation: "register user",
    success: &[200, 201],
    failures: &[
        KnownFailure::new(
            400,
            ErrorKind::Validation,
            "There is missing field(s) in the RegistrationRequest or it is formed improperly.",
        ),
        KnownFailure::new(403, ErrorKind::AuthExpiredOrMissing, AUTH_TOKEN_REJECTED),
        KnownFailure::new(409, ErrorKind::Conflict, "The user already exists."),
    ],
};

const AUTHENTICATE: StatusPolicy = StatusPolicy {
    operation: "authenticate",
    success: &[200, 201],
    failures: &[
        KnownFailure::new(
            400,
            ErrorKind::Validation,
            "There is missing field(s) in the AuthenticationRequest or it is formed improperly.",
        ),
        KnownFailure::new(401, ErrorKind::AuthInvalid, "The user or password is invalid."),
        KnownFailure::new(
            501,
            ErrorKind::Unsupported,
            "This system does not support authentication.",
        ),
    ],
};

/// New user account
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub password: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub permissions: Vec<String>,
    pub groups: Vec<String>,
}

/// Login credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationRequest<'a> {
    user: AuthUser<'a>,
    secret: AuthSecret<'a>,
}

#[derive(Serialize)]
struct AuthUser<'a> {
    name: &'a str,
    #[serde(rename = "isAdmin")]
    is_admin: bool,
}

#[derive(Serialize)]
struct AuthSecret<'a> {
    password: &'a str,
}

#[derive(Clone)]
pub struct AuthOperations {
    ctx: OperationContext,
}

impl AuthOperations {
    pub fn new(ctx: OperationContext) -> Self {
        Self { ctx }
    }

    pub async fn register(&self, user: &RegistrationRequest) -> Result<Value> {
        tracing::debug!(user = %user.name, "registering user");
        let request = self.ctx.authorized(ApiRequest::post(&["register"]).json(serde_json::json!(user)));
        let payload = self.ctx.call(&REGISTER, request).await?;
        tracing::info!(user = %user.name, "user registered");
        Ok(payload)
    }

    /// Exchange credentials for a token and start the session with it.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<String> {
        tracing::debug!(user = %credentials.username, "authenticating");
        let body = AuthenticationRequest {
            user: AuthUser {
                name: &credentials.username,
                is_admin: credentials.is_admin,
            },
            secret: AuthSecret {
                password: &credentials.password,
            },
        };

        let request = ApiRequest::put(&["authenticate2"]).json(serde_json::json!(body));
        let payload = self.ctx.call(&AUTHENTICATE, request).await?;
        let token = extract_token(payload)?;

        self.ctx.session().begin(&token);
        tracing::info!(user = %credentials.username, "user authenticated");
        Ok(token)
    }

    pub fn logout(&self) {
        self.ctx.session().logout();
    }
}

/// The token arrives as a JSON string, plain text, or `{"token": ..}`.
fn extract_token(payload: Value) -> Result<String> {
    let token = match payload {
        Value::String(token) => token,
        Value::Object(map) => map
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default(),
        _ => String::new(),
    };

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::UnexpectedPayload(
            "authentication response did not contain a token".to_string(),
        ));
    }
    Ok(token.to_string())
}
