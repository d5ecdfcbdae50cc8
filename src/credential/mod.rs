//! API key credentials.
//!
//! A credential is `{id}:{secret}` where the secret is 32 random bytes
//! rendered in Base58 with the Ripple alphabet. Only the SHA-256 of the
//! secret is ever stored.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Secret length in bytes.
pub const SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("invalid credential format")]
    InvalidCredentialFormat,
}

/// Generate a fresh random secret.
///
/// Panics if the operating system RNG is unavailable; there is no safe way
/// to continue issuing credentials without it.
pub fn generate_secret() -> [u8; SECRET_LEN] {
    let mut secret = [0u8; SECRET_LEN];
    OsRng.fill_bytes(&mut secret);
    secret
}

/// SHA-256 of a secret, as stored.
pub fn hash_secret(secret: &[u8]) -> [u8; 32] {
    Sha256::digest(secret).into()
}

/// Compare `secret` against a stored hash in constant time.
pub fn secret_matches(secret: &[u8], stored_hash: &[u8]) -> bool {
    hash_secret(secret).as_slice().ct_eq(stored_hash).into()
}

/// Base58 (Ripple alphabet).
pub fn encode(bytes: &[u8]) -> String {
    bs58::encode(bytes)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_string()
}

pub fn decode(input: &str) -> Result<Vec<u8>, CredentialError> {
    bs58::decode(input)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_vec()
        .map_err(|_| CredentialError::InvalidCredentialFormat)
}

/// Parsed `id:secret` credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: i64,
    pub secret: Vec<u8>,
}

impl Credential {
    pub fn new(id: i64, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            secret: secret.into(),
        }
    }

    /// Whether this credential's secret hashes to `stored_hash`.
    pub fn matches(&self, stored_hash: &[u8]) -> bool {
        secret_matches(&self.secret, stored_hash)
    }
}

impl FromStr for Credential {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(id), Some(secret), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CredentialError::InvalidCredentialFormat);
        };

        let id = id
            .parse::<i64>()
            .map_err(|_| CredentialError::InvalidCredentialFormat)?;
        Ok(Self::new(id, decode(secret)?))
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, encode(&self.secret))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
