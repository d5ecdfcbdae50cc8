use crate::auth::Authenticator;
use crate::config::AuthConfig;

/// Shared gateway state.
#[derive(Clone)]
pub struct AppState {
    /// Check / verify protocol, also owns the registry and store
    pub authenticator: Authenticator,
    /// Parameter names, replay window and key expiry defaults
    pub auth_config: AuthConfig,
}

impl AppState {
    pub fn new(authenticator: Authenticator, auth_config: AuthConfig) -> Self {
        Self {
            authenticator,
            auth_config,
        }
    }
}
