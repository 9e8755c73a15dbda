//! Transport layer for registry API requests
//!
//! [`HttpSender`] is the seam between request construction and the network:
//! [`HttpTransport`] implements it with reqwest against a fixed base endpoint,
//! tests substitute scripted senders. [`Transport`] wraps a sender and runs
//! every response through the registered [`ResponseInterceptor`]s before the
//! calling operation classifies it.

use crate::error::ConfigError;
use crate::error::handlers::NetworkErrorHandler;
use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Header carrying the session token on authenticated requests
pub const AUTH_HEADER: &str = "X-Authorization";

/// One registry request, built per call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path segments relative to the base endpoint, unencoded
    pub segments: Vec<String>,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            body: None,
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::GET, segments)
    }

    pub fn post(segments: &[&str]) -> Self {
        Self::new(Method::POST, segments)
    }

    pub fn put(segments: &[&str]) -> Self {
        Self::new(Method::PUT, segments)
    }

    pub fn delete(segments: &[&str]) -> Self {
        Self::new(Method::DELETE, segments)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Attach the session token; an absent or empty token adds no header.
    pub fn auth_token(self, token: Option<String>) -> Self {
        match token {
            Some(token) if !token.is_empty() => self.header(AUTH_HEADER, token),
            _ => self,
        }
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Path for display, e.g. `/package/42/rate`
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Status and body of a response that reached the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string().into_bytes())
    }

    /// Body as JSON; plain text becomes a JSON string, an empty body `null`.
    pub fn payload(&self) -> Value {
        let text = String::from_utf8_lossy(&self.body);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
    }
}

/// The request never produced a response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{0}")]
    NoResponse(String),
    /// A header could not be encoded; nothing was sent
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Sends one request and returns whatever status the server answered with
#[async_trait]
pub trait HttpSender: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// Observes every response before it is classified
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, request: &ApiRequest, response: &RawResponse);
}

/// reqwest-backed sender with a fixed base endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: Url, user_agent: &str) -> Result<Self, ConfigError> {
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Encode every request header before anything goes on the wire.
    fn header_map(request: &ApiRequest) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for (name, value) in &request.headers {
            let invalid = |reason: String| TransportError::InvalidHeader {
                name: name.clone(),
                reason,
            };
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| invalid("value must be visible ASCII".to_string()))?;
            headers.append(header_name, header_value);
        }
        Ok(headers)
    }

    /// Join the request segments onto the base path, percent-encoding each.
    fn endpoint(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                TransportError::NoResponse(format!(
                    "base URL {} cannot carry a path",
                    self.base_url
                ))
            })?;
            path.pop_if_empty();
            path.extend(request.segments.iter());
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl HttpSender for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let headers = Self::header_map(request)?;
        let url = self.endpoint(request)?;

        let mut builder = self.client.request(request.method.clone(), url).headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::NoResponse(NetworkErrorHandler::describe(&e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::NoResponse(NetworkErrorHandler::describe(&e)))?
            .to_vec();

        Ok(RawResponse { status, body })
    }
}

/// Sender plus interceptor chain shared by all operations
#[derive(Clone)]
pub struct Transport {
    sender: Arc<dyn HttpSender>,
    interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Transport {
    pub fn new(sender: Arc<dyn HttpSender>) -> Self {
        Self {
            sender,
            interceptors: Vec::new(),
        }
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        tracing::debug!(method = %request.method, path = %request.path(), "sending request");

        let response = self.sender.send(&request).await?;

        tracing::debug!(
            method = %request.method,
            path = %request.path(),
            status = response.status,
            "response received"
        );

        for interceptor in &self.interceptors {
            interceptor.on_response(&request, &response);
        }

        Ok(response)
    }
}
