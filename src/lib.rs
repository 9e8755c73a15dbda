//! Package Registry Client Library
//!
//! This file serves as the library root for the pkg-registry-client crate.
//! It exposes the typed registry operations, the shared session context and
//! the error taxonomy every operation reports through.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod session;

pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind, Result};
pub use logging::Logger;
pub use registry::{
    Credentials, GroupRequest, PackageQuery, RegistrationRequest, RegistryClient,
    RegistryClientBuilder,
};
pub use session::{Navigator, Notifier, SessionContext, TokenStore};
