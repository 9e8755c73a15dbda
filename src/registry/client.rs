// RegistryClient is the facade the calling layer talks to. It wires one
// SessionContext into the transport (through the expiry interceptor) and into
// every operation group, so all call sites share the same token and the same
// expiry latch.

use crate::config::ClientConfig;
use crate::error::{ConfigError, Result};
use crate::registry::operations::{
    AuthOperations, Credentials, GroupRequest, OperationContext, PackageOperations,
    RegistrationRequest, TrackOperations, UserOperations,
};
use crate::registry::transport::{HttpSender, HttpTransport, ResponseInterceptor, Transport};
use crate::session::{
    ExpiryInterceptor, FileTokenStore, MemoryTokenStore, Navigator, Notifier, SessionContext,
    TokenStore, TracingNavigator, TracingNotifier,
};
use serde_json::Value;
use std::sync::Arc;

pub struct RegistryClientBuilder {
    config: ClientConfig,
    sender: Option<Arc<dyn HttpSender>>,
    store: Option<Arc<dyn TokenStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
    interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl RegistryClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            sender: None,
            store: None,
            navigator: None,
            notifier: None,
            interceptors: Vec::new(),
        }
    }

    /// Replace the reqwest sender, e.g. with a scripted one in tests.
    pub fn with_sender(mut self, sender: Arc<dyn HttpSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Extra interceptor, run after the expiry interceptor.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> std::result::Result<RegistryClient, ConfigError> {
        self.config.validate()?;

        let sender: Arc<dyn HttpSender> = match self.sender {
            Some(sender) => sender,
            None => Arc::new(HttpTransport::new(
                self.config.base_url()?,
                &self.config.user_agent,
            )?),
        };

        let store: Arc<dyn TokenStore> = match (self.store, &self.config.session_file) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(FileTokenStore::new(path.clone())),
            (None, None) => Arc::new(MemoryTokenStore::default()),
        };

        let session = Arc::new(
            SessionContext::new(
                store,
                self.navigator.unwrap_or_else(|| Arc::new(TracingNavigator)),
                self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            )
            .with_token_key(self.config.token_key.clone())
            .with_routes(self.config.login_route.clone(), self.config.home_route.clone()),
        );

        let mut transport = Transport::new(sender)
            .with_interceptor(Arc::new(ExpiryInterceptor::new(session.clone())));
        for interceptor in self.interceptors {
            transport = transport.with_interceptor(interceptor);
        }

        tracing::debug!(base_url = %self.config.base_url, "registry client ready");

        let ctx = OperationContext::new(transport, session.clone());
        Ok(RegistryClient {
            session,
            auth: AuthOperations::new(ctx.clone()),
            users: UserOperations::new(ctx.clone()),
            packages: PackageOperations::new(ctx.clone()),
            tracks: TrackOperations::new(ctx),
        })
    }
}

#[derive(Clone)]
pub struct RegistryClient {
    session: Arc<SessionContext>,
    auth: AuthOperations,
    users: UserOperations,
    packages: PackageOperations,
    tracks: TrackOperations,
}

impl RegistryClient {
    pub fn builder(config: ClientConfig) -> RegistryClientBuilder {
        RegistryClientBuilder::new(config)
    }

    pub fn new(config: ClientConfig) -> std::result::Result<Self, ConfigError> {
        Self::builder(config).build()
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub async fn register(&self, user: &RegistrationRequest) -> Result<Value> {
        self.auth.register(user).await
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<String> {
        self.auth.authenticate(credentials).await
    }

    pub fn logout(&self) {
        self.auth.logout()
    }

    pub async fn list_users(&self) -> Result<Value> {
        self.users.list_users().await
    }

    pub async fn list_groups_and_permissions(&self) -> Result<Value> {
        self.users.list_groups_and_permissions().await
    }

    pub async fn add_group(&self, group: &GroupRequest) -> Result<Value> {
        self.users.add_group(group).await
    }

    pub async fn delete_group(&self, group_id: u64) -> Result<Value> {
        self.users.delete_group(group_id).await
    }

    pub async fn query_packages(&self, query: Value, offset: Option<u64>) -> Result<Value> {
        self.packages.query_packages(query, offset).await
    }

    pub async fn get_package(&self, package_id: &str) -> Result<Value> {
        self.packages.get_package(package_id).await
    }

    pub async fn update_package(&self, package_id: &str, package: Value) -> Result<Value> {
        self.packages.update_package(package_id, package).await
    }

    pub async fn reset_registry(&self) -> Result<Value> {
        self.packages.reset_registry().await
    }

    pub async fn package_rate(&self, package_id: &str) -> Result<Value> {
        self.packages.package_rate(package_id).await
    }

    pub async fn package_cost(&self, package_id: &str, dependency: bool) -> Result<f64> {
        self.packages.package_cost(package_id, dependency).await
    }

    pub async fn search_by_regex(&self, regex: &str) -> Result<Value> {
        self.packages.search_by_regex(regex).await
    }

    pub async fn list_tracks(&self) -> Result<Value> {
        self.tracks.list_tracks().await
    }

    pub async fn upload_by_url(&self, js_program: &str, url: &str) -> Result<Value> {
        self.packages.upload_by_url(js_program, url).await
    }

    pub async fn upload_by_content(&self, content: &str, js_program: &str, debloat: bool) -> Result<Value> {
        self.packages.upload_by_content(content, js_program, debloat).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_rejects_invalid_config() {
        assert!(RegistryClient::new(ClientConfig::new("mailto:someone")).is_err());
    }

    #[test]
    fn build_restores_token_from_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileTokenStore::new(&path).set("authToken", "bearer saved").unwrap();

        let client = RegistryClient::new(ClientConfig::default().with_session_file(&path)).unwrap();
        assert_eq!(client.session().current_token().as_deref(), Some("bearer saved"));
    }

    #[test]
    fn memory_session_when_no_file_configured() {
        let client = RegistryClient::new(ClientConfig::default()).unwrap();
        assert!(!client.session().is_authenticated());
    }
}
