//! Session-expiry interception

use crate::registry::transport::{AUTH_HEADER, ApiRequest, RawResponse, ResponseInterceptor};
use crate::session::SessionContext;
use std::sync::Arc;

/// Status the registry answers with once a token is no longer accepted
pub const SESSION_EXPIRED_STATUS: u16 = 403;

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Runs the expiry transition when a response carries the expiry status and
/// the request was sent with the token the session still holds
#[derive(Debug, Clone)]
pub struct ExpiryInterceptor {
    session: Arc<SessionContext>,
}

impl ExpiryInterceptor {
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self { session }
    }
}

impl ResponseInterceptor for ExpiryInterceptor {
    fn on_response(&self, request: &ApiRequest, response: &RawResponse) {
        if response.status != SESSION_EXPIRED_STATUS {
            return;
        }

        let fired = self
            .session
            .handle_expiry_for(request.header_value(AUTH_HEADER));
        tracing::debug!(path = %request.path(), fired, "expiry status intercepted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::transport::{HttpSender, Transport, TransportError};
    use crate::session::testing::fixture;
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    /// Answers every request with 403; group listings take longer than the rest
    struct SlowForbidden;

    #[async_trait]
    impl HttpSender for SlowForbidden {
        async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
            let delay = if request.path().ends_with("groups-permissions") { 80 } else { 5 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(RawResponse::new(403, Vec::new()))
        }
    }

    fn transport_for(fx: &crate::session::testing::Fixture) -> Transport {
        Transport::new(Arc::new(SlowForbidden))
            .with_interceptor(Arc::new(ExpiryInterceptor::new(fx.session.clone())))
    }

    #[tokio::test]
    async fn concurrent_expiry_signals_fire_once() {
        let fx = fixture();
        fx.session.begin("bearer t");
        let transport = transport_for(&fx);

        let requests = (0..3).map(|_| {
            transport.execute(ApiRequest::get(&["users"]).auth_token(fx.session.current_token()))
        });
        let results = futures::future::join_all(requests).await;

        assert!(results.iter().all(|r| r.as_ref().unwrap().status == 403));
        assert_eq!(fx.notifier.messages.lock().unwrap().len(), 1);
        assert_eq!(fx.navigator.routes.lock().unwrap().len(), 1);
        assert_eq!(fx.store.removals.load(Ordering::SeqCst), 1);
        assert_eq!(fx.session.current_token(), None);
    }

    #[tokio::test]
    async fn late_rejection_of_old_token_spares_new_login() {
        let fx = fixture();
        fx.session.begin("bearer A");
        let transport = transport_for(&fx);

        let slow = tokio::spawn({
            let transport = transport.clone();
            let request = ApiRequest::get(&["users", "groups-permissions"])
                .auth_token(fx.session.current_token());
            async move { transport.execute(request).await }
        });
        transport
            .execute(ApiRequest::get(&["users"]).auth_token(fx.session.current_token()))
            .await
            .unwrap();

        fx.session.begin("bearer B");
        assert_eq!(slow.await.unwrap().unwrap().status, 403);

        assert_eq!(fx.session.current_token().as_deref(), Some("bearer B"));
        assert_eq!(fx.notifier.messages.lock().unwrap().len(), 1);
        assert_eq!(*fx.navigator.routes.lock().unwrap(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn other_statuses_leave_session_alone() {
        let fx = fixture();
        fx.session.begin("bearer t");
        let interceptor = ExpiryInterceptor::new(fx.session.clone());

        for status in [200, 401, 404, 500] {
            interceptor.on_response(&ApiRequest::get(&["users"]), &RawResponse::new(status, Vec::new()));
        }

        assert_eq!(fx.session.current_token().as_deref(), Some("bearer t"));
        assert!(fx.navigator.routes.lock().unwrap().is_empty());
    }
}
