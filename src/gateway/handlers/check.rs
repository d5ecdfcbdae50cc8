//! Credential check and signature verification handlers.
//!
//! Credential, signature and timestamp are read from the query string
//! first, falling back to headers. The raw request body is the signed
//! payload.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{Query, State},
    http::HeaderMap,
};

use super::super::state::AppState;
use super::super::types::CheckResponse;
use crate::auth::{AuthError, AuthRequest, SignatureRequirement};

/// Upper bound on a signed request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Query parameter `query`, else header `header`; empty values are absent.
pub fn lookup<'a>(
    params: &'a HashMap<String, String>,
    headers: &'a HeaderMap,
    query: &str,
    header: &str,
) -> Option<&'a str> {
    params
        .get(query)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get(header)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
        })
}

async fn read_body(body: Body) -> Result<axum::body::Bytes, AuthError> {
    to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        tracing::debug!(error = %e, limit = MAX_BODY_BYTES, "Request body rejected");
        AuthError::bad_request(format!("body read: {e}"))
    })
}

async fn verify_with(
    state: &AppState,
    params: &HashMap<String, String>,
    headers: &HeaderMap,
    body: Body,
    requirement: SignatureRequirement,
) -> Result<Json<CheckResponse>, AuthError> {
    let cfg = &state.auth_config;
    let request = AuthRequest {
        credential: lookup(params, headers, &cfg.apikey_query, &cfg.apikey_header),
        signature: lookup(params, headers, &cfg.signature_query, &cfg.signature_header),
        timestamp: lookup(params, headers, &cfg.timestamp_query, &cfg.timestamp_header),
        body: &[],
    };

    // The body is only read once the credential and timestamp are accepted.
    let identity = state
        .authenticator
        .verify_deferred(&request, requirement, read_body(body))
        .await?;
    Ok(Json(identity.into()))
}

/// Check a credential
///
/// Bearer-style: the credential alone authenticates the caller.
#[utoipa::path(
    post,
    path = "/check",
    params(
        ("apikey" = Option<String>, Query, description = "Credential `id:secret`"),
        ("X-API-Key" = Option<String>, Header, description = "Credential, if not in the query"),
    ),
    responses(
        (status = 200, description = "Credential valid", body = CheckResponse),
        (status = 401, description = "Unauthorized", body = crate::auth::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "Auth"
)]
pub async fn check(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<CheckResponse>, AuthError> {
    let cfg = &state.auth_config;
    let credential = lookup(&params, &headers, &cfg.apikey_query, &cfg.apikey_header);
    let identity = state.authenticator.check(credential).await?;
    Ok(Json(identity.into()))
}

/// Verify a signed request
///
/// The signature covers `body || timestamp` and is required.
#[utoipa::path(
    post,
    path = "/verify",
    params(
        ("apikey" = Option<String>, Query, description = "Credential `id:secret`"),
        ("signature" = Option<String>, Query, description = "Base64 signature"),
        ("timestamp" = Option<String>, Query, description = "Unix seconds"),
        ("X-API-Key" = Option<String>, Header, description = "Credential, if not in the query"),
        ("X-Signature" = Option<String>, Header, description = "Signature, if not in the query"),
        ("X-Timestamp" = Option<String>, Header, description = "Timestamp, if not in the query"),
    ),
    request_body(content = String, description = "Signed payload", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Signature valid", body = CheckResponse),
        (status = 400, description = "Unknown algorithm, malformed signature or body over 1 MiB", body = crate::auth::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::auth::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "Auth"
)]
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<CheckResponse>, AuthError> {
    verify_with(&state, &params, &headers, body, SignatureRequirement::Required).await
}

/// Check, or verify when signed
///
/// Unsigned requests succeed with `verified = false`.
#[utoipa::path(
    post,
    path = "/checkorverify",
    params(
        ("apikey" = Option<String>, Query, description = "Credential `id:secret`"),
        ("signature" = Option<String>, Query, description = "Base64 signature"),
        ("timestamp" = Option<String>, Query, description = "Unix seconds"),
    ),
    request_body(content = String, description = "Signed payload", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Credential valid", body = CheckResponse),
        (status = 400, description = "Unknown algorithm, malformed signature or body over 1 MiB", body = crate::auth::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::auth::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "Auth"
)]
pub async fn check_or_verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<CheckResponse>, AuthError> {
    verify_with(&state, &params, &headers, body, SignatureRequirement::Optional).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{AlgorithmRegistry, SignAlgorithm, pem};
    use crate::auth::{AuthErrorCode, Authenticator};
    use crate::config::AuthConfig;
    use crate::credential::{Credential, generate_secret, hash_secret};
    use crate::store::{MemoryCredentialStore, NewCredential};
    use axum::http::HeaderValue;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    const TWO_MIB: usize = 2 * 1024 * 1024;

    /// State with credential id 1 bound to an EdDSA key; returns the credential.
    fn state() -> (Arc<AppState>, String) {
        let store = Arc::new(MemoryCredentialStore::new());
        let keys = AlgorithmRegistry::with_defaults()
            .lookup("EdDSA")
            .unwrap()
            .generate()
            .unwrap();
        let secret = generate_secret();
        store.insert_with_id(
            1,
            NewCredential {
                secret_hash: hash_secret(&secret).to_vec(),
                public_key: Some(keys.public_key),
                algorithm: Some("EdDSA".to_string()),
                subject: "alice".to_string(),
                name: None,
                expires_at: None,
                extra: None,
            },
        );
        let authenticator = Authenticator::new(
            Arc::new(AlgorithmRegistry::with_defaults()),
            store,
            None,
            Duration::from_secs(300),
        );
        let state = Arc::new(AppState::new(authenticator, AuthConfig::default()));
        (state, Credential::new(1, secret).to_string())
    }

    fn now_secs() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            .to_string()
    }

    #[tokio::test]
    async fn test_large_body_without_credential_is_unauthorized() {
        let (state, _) = state();

        let result = verify(
            State(state.clone()),
            Query(HashMap::new()),
            HeaderMap::new(),
            Body::from(vec![0u8; TWO_MIB]),
        )
        .await;
        assert_eq!(result.err().unwrap().code, AuthErrorCode::Unauthorized);

        let result = check_or_verify(
            State(state),
            Query(HashMap::new()),
            HeaderMap::new(),
            Body::from(vec![0u8; TWO_MIB]),
        )
        .await;
        assert_eq!(result.err().unwrap().code, AuthErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_large_body_with_stale_timestamp_is_unauthorized() {
        let (state, credential) = state();
        let mut params = HashMap::new();
        params.insert("apikey".to_string(), credential);
        params.insert("signature".to_string(), pem::to_base64(&[0u8; 64]));
        params.insert("timestamp".to_string(), "1".to_string());

        let result = verify(
            State(state),
            Query(params),
            HeaderMap::new(),
            Body::from(vec![0u8; TWO_MIB]),
        )
        .await;
        assert_eq!(result.err().unwrap().code, AuthErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_body_over_limit_is_bad_request() {
        let (state, credential) = state();
        let mut params = HashMap::new();
        params.insert("apikey".to_string(), credential);
        params.insert("signature".to_string(), pem::to_base64(&[0u8; 64]));
        params.insert("timestamp".to_string(), now_secs());

        let result = check_or_verify(
            State(state),
            Query(params),
            HeaderMap::new(),
            Body::from(vec![0u8; MAX_BODY_BYTES + 1]),
        )
        .await;
        assert_eq!(result.err().unwrap().code, AuthErrorCode::BadRequest);
    }

    #[tokio::test]
    async fn test_body_at_limit_is_read() {
        let (state, credential) = state();
        let mut params = HashMap::new();
        params.insert("apikey".to_string(), credential);
        params.insert("signature".to_string(), pem::to_base64(&[0u8; 64]));
        params.insert("timestamp".to_string(), now_secs());

        // Read in full, then rejected on the signature itself.
        let result = verify(
            State(state),
            Query(params),
            HeaderMap::new(),
            Body::from(vec![0u8; MAX_BODY_BYTES]),
        )
        .await;
        assert_eq!(result.err().unwrap().code, AuthErrorCode::Unauthorized);
    }

    #[test]
    fn test_lookup_prefers_query() {
        let mut params = HashMap::new();
        params.insert("apikey".to_string(), "1:query".to_string());
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("1:header"));

        assert_eq!(
            lookup(&params, &headers, "apikey", "X-API-Key"),
            Some("1:query")
        );
    }

    #[test]
    fn test_lookup_falls_back_to_header() {
        let mut params = HashMap::new();
        params.insert("apikey".to_string(), String::new());
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("1:header"));

        assert_eq!(
            lookup(&params, &headers, "apikey", "X-API-Key"),
            Some("1:header")
        );
        assert_eq!(lookup(&HashMap::new(), &HeaderMap::new(), "apikey", "X-API-Key"), None);
    }
}
