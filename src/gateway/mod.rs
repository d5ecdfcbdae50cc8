//! HTTP gateway.
//!
//! Thin axum adapter over [`crate::auth::Authenticator`] and the credential
//! store. Every route except the OpenAPI document and Swagger UI is mounted
//! under the configured `base_path`.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

/// Normalise `base_path` to `""` (root) or `/prefix` without a trailing slash.
fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Build the gateway router.
pub fn router(state: Arc<AppState>, base_path: &str) -> Router {
    let api = Router::new()
        .route("/check", post(handlers::check))
        .route("/verify", post(handlers::verify))
        .route("/checkorverify", post(handlers::check_or_verify))
        .route("/apikeys", post(handlers::create_key))
        .route("/apikeys/search", post(handlers::search_keys))
        .route("/apikeys/{id}", get(handlers::get_key))
        .route("/health/liveness", get(handlers::liveness))
        .route("/health/readiness", get(handlers::readiness))
        .with_state(state);

    let base = normalize_base_path(base_path);
    let app = if base.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&base, api)
    };

    // Stateless, added after with_state
    app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Serve on an already bound listener until the server fails.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app).await
}

/// Bind `addr` and serve the gateway.
pub async fn run_server(addr: &str, state: Arc<AppState>, base_path: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    let base = normalize_base_path(base_path);
    tracing::info!(addr = %addr, base_path = %base, "Gateway listening");
    tracing::info!("API Docs: http://{}/docs", addr);

    serve(listener, router(state, base_path)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("/auth/"), "/auth");
        assert_eq!(normalize_base_path("api/v1"), "/api/v1");
    }
}
