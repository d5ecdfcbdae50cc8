//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`
//!
//! Paths are listed relative to the configured `base_path`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::ErrorResponse;
use crate::gateway::types::{
    CheckResponse, CreateKeyRequest, CreateKeyResponse, HealthResponse, KeyInfoResponse,
    SearchKeysRequest,
};

/// Credential header security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-API-Key",
                    r#"Credential `{id}:{base58 secret}` (also accepted as the `apikey` query parameter).

Signed requests add:
- X-Timestamp: Unix seconds
- X-Signature: base64 signature over `{body}{timestamp}` with the key bound to the credential"#,
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "API Key Gate",
        version = "0.1.0",
        description = "Issues API credentials and verifies credential and signature on requests.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::check::check,
        crate::gateway::handlers::check::verify,
        crate::gateway::handlers::check::check_or_verify,
        crate::gateway::handlers::manage::create_key,
        crate::gateway::handlers::manage::search_keys,
        crate::gateway::handlers::manage::get_key,
        crate::gateway::handlers::health::liveness,
        crate::gateway::handlers::health::readiness,
    ),
    components(
        schemas(
            CheckResponse,
            CreateKeyRequest,
            CreateKeyResponse,
            SearchKeysRequest,
            KeyInfoResponse,
            HealthResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Credential check and signature verification"),
        (name = "Management", description = "Credential issuing and lookup"),
        (name = "System", description = "Liveness and readiness")
    )
)]
pub struct ApiDoc;
