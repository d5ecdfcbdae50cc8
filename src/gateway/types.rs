//! Request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::algo::pem;
use crate::auth::Identity;
use crate::store::CredentialInfo;

/// Maximum serialised size of `extra`.
pub const MAX_EXTRA_BYTES: usize = 2048;

/// Successful check / verify.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckResponse {
    /// Credential id
    #[schema(example = "42")]
    pub id: String,
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub extra: Option<serde_json::Value>,
    /// Absent for check; whether a signature was verified otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl From<Identity> for CheckResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            sub: identity.subject,
            extra: identity.extra,
            verified: identity.verified,
        }
    }
}

fn validate_extra(extra: &serde_json::Value) -> Result<(), ValidationError> {
    let size = serde_json::to_vec(extra).map(|v| v.len()).unwrap_or(usize::MAX);
    if size > MAX_EXTRA_BYTES {
        return Err(ValidationError::new("extra_too_large"));
    }
    Ok(())
}

/// Issue a new credential.
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateKeyRequest {
    /// Subject the credential is issued to
    #[validate(length(min = 1, max = 255))]
    #[serde(default)]
    pub sub: String,
    /// Signature algorithm; generates a keypair unless `publickey` is given
    #[schema(example = "ES256")]
    pub alg: Option<String>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    /// Lifetime in seconds; 0 or absent uses the configured default
    pub exp_sec: Option<i64>,
    /// PEM `PUBLIC KEY` to bind instead of generating one
    pub publickey: Option<String>,
    #[validate(custom(function = "validate_extra"))]
    #[schema(value_type = Option<Object>)]
    pub extra: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateKeyResponse {
    /// `id:secret`, shown once
    pub apikey: String,
    /// Base64 DER of the bound public key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publickey: Option<String>,
    /// Base64 PKCS#8 DER of a generated private key, shown once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privatekey: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct SearchKeysRequest {
    #[validate(length(min = 1, max = 255))]
    #[serde(default)]
    pub sub: String,
}

/// Credential as shown by the management API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KeyInfoResponse {
    pub id: i64,
    pub sub: String,
    pub name: Option<String>,
    pub alg: Option<String>,
    /// Base64 DER public key
    pub key: Option<String>,
    pub exp: Option<DateTime<Utc>>,
    #[schema(value_type = Option<Object>)]
    pub extra: Option<serde_json::Value>,
}

impl From<CredentialInfo> for KeyInfoResponse {
    fn from(info: CredentialInfo) -> Self {
        Self {
            id: info.id,
            sub: info.subject,
            name: info.name,
            alg: info.algorithm,
            key: info.public_key.as_deref().map(pem::to_base64),
            exp: info.expires_at,
            extra: info.extra,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

impl HealthResponse {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}
