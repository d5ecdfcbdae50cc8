//! Credential persistence.
//!
//! The authentication path needs exactly one query,
//! [`CredentialStore::get_credential_for_verify`], which must never return
//! an expired record. The remaining operations back the management API.
//!
//! ## Implementations
//! - [`postgres::PgCredentialStore`]: `apikeys` table over a sqlx pool
//! - [`memory::MemoryCredentialStore`]: DashMap-backed, for tests and local runs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use memory::MemoryCredentialStore;
pub use postgres::{Database, PgCredentialStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Everything the verification path needs about one credential.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCredentialRecord {
    pub id: i64,
    /// SHA-256 of the secret.
    pub secret_hash: Vec<u8>,
    /// PKIX DER public key, if a signing keypair is bound.
    pub public_key: Option<Vec<u8>>,
    pub algorithm: Option<String>,
    pub subject: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub extra: Option<serde_json::Value>,
}

/// Row to insert when issuing a credential.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub secret_hash: Vec<u8>,
    pub public_key: Option<Vec<u8>>,
    pub algorithm: Option<String>,
    pub subject: String,
    pub name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub extra: Option<serde_json::Value>,
}

/// Display view of a credential, without the secret hash.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialInfo {
    pub id: i64,
    pub subject: String,
    pub name: Option<String>,
    pub algorithm: Option<String>,
    pub public_key: Option<Vec<u8>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub extra: Option<serde_json::Value>,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch an unexpired credential by id.
    async fn get_credential_for_verify(
        &self,
        id: i64,
    ) -> Result<Option<StoredCredentialRecord>, StoreError>;

    /// Insert a credential and return its id.
    async fn insert(&self, credential: NewCredential) -> Result<i64, StoreError>;

    /// All credentials issued to `subject`, expired ones included.
    async fn search_by_subject(&self, subject: &str) -> Result<Vec<CredentialInfo>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<CredentialInfo>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
