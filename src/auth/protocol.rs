//! Request authentication.
//!
//! `check` proves possession of a credential; `verify` additionally proves
//! the request body was signed by the key bound to that credential within
//! the replay window.
//!
//! ```text
//! check:   credential -> cache? -> parse -> store lookup -> hash compare -> identity
//! verify:  check -> signature? -> timestamp parse -> replay window
//!               -> read body -> body || timestamp -> algorithm -> base64 -> validate
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, error};

use super::cache::VerificationCache;
use super::error::AuthError;
use crate::algo::{AlgorithmRegistry, pem};
use crate::credential::Credential;
use crate::store::{CredentialStore, StoredCredentialRecord};

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: i64,
    pub subject: String,
    pub extra: Option<serde_json::Value>,
    /// `None` for check, otherwise whether a signature was verified.
    pub verified: Option<bool>,
}

impl Identity {
    fn from_record(record: StoredCredentialRecord, verified: Option<bool>) -> Self {
        Self {
            id: record.id,
            subject: record.subject,
            extra: record.extra,
            verified,
        }
    }
}

/// What to do when a request carries no signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureRequirement {
    /// Reject unsigned requests.
    Required,
    /// Accept unsigned requests with `verified = false`.
    Optional,
}

/// Inputs of one authentication attempt. Empty strings count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthRequest<'a> {
    pub credential: Option<&'a str>,
    pub signature: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub body: &'a [u8],
}

/// `body || timestamp`, the bytes a client signs.
pub fn signed_message(body: &[u8], timestamp: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(body.len() + timestamp.len());
    message.extend_from_slice(body);
    message.extend_from_slice(timestamp.as_bytes());
    message
}

/// Reject timestamps older than `threshold` relative to `now_ms`.
///
/// `timestamp` is Unix seconds in decimal. Timestamps in the future are
/// accepted.
pub fn check_timestamp(timestamp: &str, now_ms: i64, threshold: Duration) -> Result<(), AuthError> {
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| AuthError::unauthorized("timestamp is not an integer"))?;
    let ts_ms = ts
        .checked_mul(1000)
        .ok_or_else(|| AuthError::unauthorized("timestamp out of range"))?;

    let threshold_ms = i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX);
    if now_ms.saturating_sub(ts_ms) > threshold_ms {
        return Err(AuthError::unauthorized(format!(
            "timestamp older than {}s",
            threshold.as_secs()
        )));
    }
    Ok(())
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Runs the check / verify protocol against a store.
#[derive(Clone)]
pub struct Authenticator {
    registry: Arc<AlgorithmRegistry>,
    store: Arc<dyn CredentialStore>,
    cache: Option<Arc<VerificationCache>>,
    timestamp_threshold: Duration,
}

impl Authenticator {
    pub fn new(
        registry: Arc<AlgorithmRegistry>,
        store: Arc<dyn CredentialStore>,
        cache: Option<VerificationCache>,
        timestamp_threshold: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            cache: cache.map(Arc::new),
            timestamp_threshold,
        }
    }

    pub fn registry(&self) -> &Arc<AlgorithmRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn cache(&self) -> Option<&VerificationCache> {
        self.cache.as_deref()
    }

    /// Resolve a credential string to its stored record.
    async fn resolve(&self, credential: Option<&str>) -> Result<StoredCredentialRecord, AuthError> {
        let raw = present(credential).ok_or_else(|| AuthError::unauthorized("missing credential"))?;

        if let Some(record) = self.cache.as_ref().and_then(|c| c.get(raw)) {
            debug!(credential_id = record.id, "Credential served from cache");
            return Ok(record);
        }

        let credential: Credential = raw
            .parse()
            .map_err(|_| AuthError::unauthorized("malformed credential"))?;

        let record = match self.store.get_credential_for_verify(credential.id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(credential_id = credential.id, "Credential not found or expired");
                return Err(AuthError::unauthorized("credential not found"));
            }
            Err(e) => {
                error!(credential_id = credential.id, error = %e, "Credential lookup failed");
                return Err(AuthError::unauthorized("credential lookup failed"));
            }
        };

        if !credential.matches(&record.secret_hash) {
            debug!(credential_id = credential.id, "Secret mismatch");
            return Err(AuthError::unauthorized("secret mismatch"));
        }

        if let Some(cache) = &self.cache {
            cache.set(raw, record.clone());
        }
        Ok(record)
    }

    /// Bearer-style check of the credential alone.
    pub async fn check(&self, credential: Option<&str>) -> Result<Identity, AuthError> {
        let record = self.resolve(credential).await?;
        Ok(Identity::from_record(record, None))
    }

    /// Check the credential, then the request signature.
    pub async fn verify(
        &self,
        request: &AuthRequest<'_>,
        requirement: SignatureRequirement,
    ) -> Result<Identity, AuthError> {
        let body = request.body;
        self.verify_deferred(request, requirement, async move { Ok(body) })
            .await
    }

    /// Like [`verify`](Self::verify), but the body is only awaited once the
    /// credential, signature presence and timestamp have been accepted.
    /// `request.body` is ignored.
    pub async fn verify_deferred<F, B>(
        &self,
        request: &AuthRequest<'_>,
        requirement: SignatureRequirement,
        body: F,
    ) -> Result<Identity, AuthError>
    where
        F: Future<Output = Result<B, AuthError>>,
        B: AsRef<[u8]>,
    {
        let record = self.resolve(request.credential).await?;

        let Some(signature) = present(request.signature) else {
            return match requirement {
                SignatureRequirement::Optional => Ok(Identity::from_record(record, Some(false))),
                SignatureRequirement::Required => {
                    debug!(credential_id = record.id, "Missing signature");
                    Err(AuthError::unauthorized("missing signature"))
                }
            };
        };

        let timestamp = present(request.timestamp).unwrap_or_default();
        if let Err(e) = check_timestamp(timestamp, now_ms(), self.timestamp_threshold) {
            debug!(credential_id = record.id, reason = %e.message, "Timestamp rejected");
            return Err(e);
        }

        let body = body.await?;
        self.validate(&record, signature, timestamp, body.as_ref())?;
        Ok(Identity::from_record(record, Some(true)))
    }

    fn validate(
        &self,
        record: &StoredCredentialRecord,
        signature: &str,
        timestamp: &str,
        body: &[u8],
    ) -> Result<(), AuthError> {
        let message = signed_message(body, timestamp);

        let name = record.algorithm.as_deref().unwrap_or_default();
        let algorithm = self.registry.lookup(name).ok_or_else(|| {
            debug!(credential_id = record.id, algorithm = name, "Unknown algorithm");
            AuthError::bad_request(format!("unknown algorithm {name:?}"))
        })?;

        let signature = pem::from_base64(signature).map_err(|e| {
            debug!(credential_id = record.id, "Signature is not base64");
            AuthError::bad_request(format!("signature decode: {e}"))
        })?;

        let Some(public_key) = record.public_key.as_deref() else {
            error!(credential_id = record.id, algorithm = name, "Stored credential has no public key");
            return Err(AuthError::internal("stored credential has no public key"));
        };
        algorithm
            .validate_signature(public_key, &signature, &message)
            .map_err(|e| {
                debug!(credential_id = record.id, algorithm = name, error = %e, "Signature rejected");
                AuthError::unauthorized(format!("signature: {e}"))
            })
    }
}
