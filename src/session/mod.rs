//! Session state shared by every registry operation
//!
//! [`SessionContext`] owns the current token and the expiry latch. It is
//! injected into the transport and the operations instead of living in a
//! global, and it reaches the platform only through the [`TokenStore`],
//! [`Navigator`] and [`Notifier`] capabilities.

pub mod expiry;
pub mod store;

pub use expiry::{ExpiryInterceptor, SESSION_EXPIRED_MESSAGE, SESSION_EXPIRED_STATUS};
pub use store::{FileTokenStore, MemoryTokenStore};

use crate::error::StorageError;
use std::sync::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Key under which the token is persisted
pub const DEFAULT_TOKEN_KEY: &str = "authToken";
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_HOME_ROUTE: &str = "/";

/// Key-value persistence for the session token
pub trait TokenStore: Send + Sync {
    /// Missing or unreadable values read as `None`.
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Moves the user to another entry point
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Presents a message to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Navigator that only records the redirect in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "navigation requested");
    }
}

/// Notifier that only records the message in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(message, "user notification");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

pub struct SessionContext {
    token: RwLock<Option<String>>,
    expired: AtomicBool,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    token_key: String,
    login_route: String,
    home_route: String,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.state())
            .field("expired", &self.expiry_latched())
            .field("token_key", &self.token_key)
            .finish()
    }
}

impl SessionContext {
    /// Create a context, picking up any token already persisted in `store`.
    pub fn new(
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            token: RwLock::new(None),
            expired: AtomicBool::new(false),
            store,
            navigator,
            notifier,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            home_route: DEFAULT_HOME_ROUTE.to_string(),
        }
        .restored()
    }

    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self.restored()
    }

    pub fn with_routes(mut self, login_route: impl Into<String>, home_route: impl Into<String>) -> Self {
        self.login_route = login_route.into();
        self.home_route = home_route.into();
        self
    }

    fn restored(self) -> Self {
        let persisted = self
            .store
            .get(&self.token_key)
            .filter(|token| !token.is_empty());
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = persisted;
        self
    }

    /// Token as of now; read fresh for every request.
    pub fn current_token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn state(&self) -> SessionState {
        if self.current_token().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn expiry_latched(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    /// Store a freshly issued token and re-arm expiry handling.
    pub fn begin(&self, token: &str) {
        {
            let mut held = self.token.write().unwrap_or_else(|e| e.into_inner());
            *held = Some(token.to_string());
            self.expired.store(false, Ordering::Release);
        }
        if let Err(e) = self.store.set(&self.token_key, token) {
            tracing::warn!(error = %e, "failed to persist session token");
        }
        tracing::info!("session started");
    }

    /// Explicit logout: drop the token and return to the home entry point.
    pub fn logout(&self) {
        self.clear_token();
        tracing::info!("session ended by logout");
        self.navigator.navigate(&self.home_route);
    }

    /// Expiry transition. Only the first call after a successful
    /// authentication has side effects; returns whether this call fired.
    pub fn handle_expiry(&self) -> bool {
        self.expire_when(|_| true)
    }

    /// Expiry transition for a response to a request sent with `sent_token`.
    /// A rejection of a token the session no longer holds is ignored.
    pub fn handle_expiry_for(&self, sent_token: Option<&str>) -> bool {
        self.expire_when(|held| held == sent_token)
    }

    fn expire_when(&self, applies: impl FnOnce(Option<&str>) -> bool) -> bool {
        let mut token = self.token.write().unwrap_or_else(|e| e.into_inner());
        if !applies(token.as_deref()) {
            tracing::debug!("expiry status for a token no longer held");
            return false;
        }
        if self
            .expired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("session expiry already handled");
            return false;
        }
        *token = None;
        drop(token);

        if let Err(e) = self.store.remove(&self.token_key) {
            tracing::warn!(error = %e, "failed to remove persisted session token");
        }
        tracing::warn!("session expired; redirecting to login");
        self.notifier.notify(SESSION_EXPIRED_MESSAGE);
        self.navigator.navigate(&self.login_route);
        true
    }

    fn clear_token(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        if let Err(e) = self.store.remove(&self.token_key) {
            tracing::warn!(error = %e, "failed to remove persisted session token");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    pub struct RecordingNavigator {
        pub routes: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, route: &str) {
            self.routes.lock().unwrap().push(route.to_string());
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub messages: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    /// Memory store that counts removals
    #[derive(Default)]
    pub struct CountingStore {
        pub inner: MemoryTokenStore,
        pub removals: AtomicUsize,
    }

    impl TokenStore for CountingStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.removals.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.remove(key)
        }
    }

    pub struct Fixture {
        pub store: Arc<CountingStore>,
        pub navigator: Arc<RecordingNavigator>,
        pub notifier: Arc<RecordingNotifier>,
        pub session: Arc<SessionContext>,
    }

    pub fn fixture() -> Fixture {
        let store = Arc::new(CountingStore::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let session = Arc::new(SessionContext::new(
            store.clone(),
            navigator.clone(),
            notifier.clone(),
        ));
        Fixture {
            store,
            navigator,
            notifier,
            session,
        }
    }
}
