//! Configuration module for the registry endpoint and session settings

use crate::error::ConfigError;
use crate::session::{DEFAULT_HOME_ROUTE, DEFAULT_LOGIN_ROUTE, DEFAULT_TOKEN_KEY};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_SESSION_FILE: &str = ".registry-session.json";

pub const BASE_URL_ENV: &str = "REGISTRY_API_URL";
pub const SESSION_FILE_ENV: &str = "REGISTRY_SESSION_FILE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub token_key: String,
    pub login_route: String,
    pub home_route: String,
    /// Where the token is persisted; `None` keeps it in memory
    pub session_file: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            home_route: DEFAULT_HOME_ROUTE.to_string(),
            session_file: None,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read `REGISTRY_API_URL` and `REGISTRY_SESSION_FILE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(BASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let session_file = lookup(SESSION_FILE_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string());

        Self {
            base_url,
            session_file: Some(PathBuf::from(session_file)),
            ..Self::default()
        }
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// Parse and check the base endpoint.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.base_url.trim()).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if self.token_key.trim().is_empty() {
            return Err(ConfigError::Invalid("token key cannot be empty".to_string()));
        }
        if !self.login_route.starts_with('/') || !self.home_route.starts_with('/') {
            return Err(ConfigError::Invalid(
                "navigation routes must start with '/'".to_string(),
            ));
        }
        Ok(())
    }
}
