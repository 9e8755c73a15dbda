//! Registry module for package registry interactions
//!
//! This module provides the transport, the per-resource operations and the
//! [`RegistryClient`] facade that ties them to one session.

pub mod client;
pub mod operations;
pub mod transport;

pub use client::{RegistryClient, RegistryClientBuilder};
pub use operations::{Credentials, GroupRequest, PackageQuery, RegistrationRequest};
pub use transport::{
    AUTH_HEADER, ApiRequest, HttpSender, HttpTransport, RawResponse, ResponseInterceptor, Transport,
    TransportError,
};
