//! Credential management handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use validator::Validate;

use super::super::state::AppState;
use super::super::types::{
    CreateKeyRequest, CreateKeyResponse, KeyInfoResponse, SearchKeysRequest,
};
use crate::algo::pem;
use crate::auth::ErrorResponse;
use crate::credential::{Credential, generate_secret, hash_secret};
use crate::store::NewCredential;

/// Management API failure.
#[derive(Debug)]
pub enum ManageError {
    /// Invalid input; the message is returned to the caller.
    BadRequest(String),
    NotFound,
    /// Store or key generation failure; logged, not returned.
    Internal(String),
}

impl IntoResponse for ManageError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))).into_response()
            }
            Self::NotFound => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new("not found"))).into_response()
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Management request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("internal server error")),
                )
                    .into_response()
            }
        }
    }
}

impl From<crate::store::StoreError> for ManageError {
    fn from(e: crate::store::StoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Issue a credential
///
/// With `alg` and no `publickey` a keypair is generated and the private key
/// is returned once. Only the SHA-256 of the secret is stored.
#[utoipa::path(
    post,
    path = "/apikeys",
    request_body = CreateKeyRequest,
    responses(
        (status = 201, description = "Credential issued", body = CreateKeyResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Management"
)]
pub async fn create_key(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<CreateKeyResponse>), ManageError> {
    req.validate()
        .map_err(|e| ManageError::BadRequest(e.to_string()))?;

    if req.publickey.is_some() && req.alg.is_none() {
        return Err(ManageError::BadRequest("publickey requires alg".into()));
    }

    let registry = state.authenticator.registry();
    let algorithm = match req.alg.as_deref() {
        Some(name) => Some(registry.lookup(name).ok_or_else(|| {
            ManageError::BadRequest(format!(
                "unknown alg {name:?}, expected one of {:?}",
                registry.names()
            ))
        })?),
        None => None,
    };

    let mut private_key = None;
    let public_key = match (&algorithm, req.publickey.as_deref()) {
        (Some(_), Some(text)) => Some(
            pem::decode(pem::PUBLIC_KEY_LABEL, text)
                .map_err(|e| ManageError::BadRequest(format!("publickey: {e}")))?,
        ),
        (Some(alg), None) => {
            let pair = alg
                .generate()
                .map_err(|e| ManageError::Internal(e.to_string()))?;
            private_key = Some(pair.private_key);
            Some(pair.public_key)
        }
        (None, _) => None,
    };

    let lifetime = match req.exp_sec {
        Some(secs) if secs > 0 => secs,
        _ => i64::try_from(state.auth_config.default_key_expiration_secs).unwrap_or(i64::MAX),
    };
    let expires_at = Duration::try_seconds(lifetime).and_then(|d| Utc::now().checked_add_signed(d));

    let secret = generate_secret();
    let new = NewCredential {
        secret_hash: hash_secret(&secret).to_vec(),
        public_key: public_key.clone(),
        algorithm: algorithm.as_ref().map(|a| a.name().to_string()),
        subject: req.sub,
        name: req.name,
        expires_at,
        extra: req.extra,
    };

    let id = state.authenticator.store().insert(new).await?;
    tracing::info!(credential_id = id, "Credential issued");

    Ok((
        StatusCode::CREATED,
        Json(CreateKeyResponse {
            apikey: Credential::new(id, secret).to_string(),
            publickey: public_key.as_deref().map(pem::to_base64),
            privatekey: private_key.as_deref().map(pem::to_base64),
        }),
    ))
}

/// Search credentials by subject
#[utoipa::path(
    post,
    path = "/apikeys/search",
    request_body = SearchKeysRequest,
    responses(
        (status = 200, description = "Matching credentials", body = Vec<KeyInfoResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    tag = "Management"
)]
pub async fn search_keys(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchKeysRequest>,
) -> Result<Json<Vec<KeyInfoResponse>>, ManageError> {
    req.validate()
        .map_err(|e| ManageError::BadRequest(e.to_string()))?;

    let found = state
        .authenticator
        .store()
        .search_by_subject(&req.sub)
        .await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

/// Get a credential by id
#[utoipa::path(
    get,
    path = "/apikeys/{id}",
    params(("id" = i64, Path, description = "Credential id")),
    responses(
        (status = 200, description = "Credential", body = KeyInfoResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    tag = "Management"
)]
pub async fn get_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<KeyInfoResponse>, ManageError> {
    state
        .authenticator
        .store()
        .get_by_id(id)
        .await?
        .map(|info| Json(info.into()))
        .ok_or(ManageError::NotFound)
}
