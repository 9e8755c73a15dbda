//! Registry operations grouped by resource
//!
//! Every operation follows the same shape: build an [`ApiRequest`], attach the
//! session token unless the endpoint is public, execute it through the shared
//! [`Transport`], and classify the response with the operation's
//! [`StatusPolicy`].

pub mod auth_operations;
pub mod package_operations;
pub mod track_operations;
pub mod user_operations;

pub use auth_operations::{AuthOperations, Credentials, RegistrationRequest};
pub use package_operations::{PackageOperations, PackageQuery};
pub use track_operations::TrackOperations;
pub use user_operations::{GroupRequest, UserOperations};

use crate::error::Result;
use crate::error::handlers::{NetworkErrorHandler, StatusPolicy};
use crate::registry::transport::{ApiRequest, Transport};
use crate::session::SessionContext;
use serde_json::Value;
use std::sync::Arc;

/// Transport and session shared by all operation groups
#[derive(Clone)]
pub struct OperationContext {
    transport: Transport,
    session: Arc<SessionContext>,
}

impl OperationContext {
    pub fn new(transport: Transport, session: Arc<SessionContext>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Attach whatever token the session holds right now.
    pub(crate) fn authorized(&self, request: ApiRequest) -> ApiRequest {
        request.auth_token(self.session.current_token())
    }

    pub(crate) async fn call(&self, policy: &StatusPolicy, request: ApiRequest) -> Result<Value> {
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| NetworkErrorHandler::into_api_error(e, policy.operation))?;
        policy.classify(&response)
    }
}
