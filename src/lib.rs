//! API Key Gate - credential issuing and request verification
//!
//! # Modules
//!
//! - [`algo`] - Signature algorithms (ES256, ES256K, EdDSA, RS256, RS512) and their registry
//! - [`credential`] - `id:secret` credentials, secret hashing, constant-time comparison
//! - [`store`] - Credential persistence (PostgreSQL, in-memory)
//! - [`auth`] - Check / verify protocol, verification cache, error mapping
//! - [`gateway`] - axum HTTP API, management endpoints, OpenAPI
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup

pub mod algo;
pub mod auth;
pub mod config;
pub mod credential;
pub mod gateway;
pub mod logging;
pub mod store;

// Convenient re-exports at crate root
pub use algo::{AlgorithmError, AlgorithmRegistry, SignAlgorithm};
pub use auth::{AuthError, AuthErrorCode, AuthRequest, Authenticator, Identity, SignatureRequirement};
pub use config::AppConfig;
pub use credential::Credential;
pub use store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};

/// Build version, with the git revision when available.
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");
