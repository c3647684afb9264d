use std::path::Path;

use crate::adapters::http::client::ApiClient;
use crate::adapters::http::hsm_service::HttpHsmService;
use crate::adapters::http::interceptor::SessionExpiryInterceptor;
use crate::adapters::session_store::file_session_store::FileSessionStore;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{HsmError, Result};
use crate::core::traits::hsm_provisioning::HsmProvisioning;
use crate::core::traits::session::SessionStore;

/// Load configuration from `--config`, or from the hsmctl home, then apply
/// the `--api-url` override.
pub fn load_config(config_path: Option<&str>, api_url: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_file(Path::new(path))?,
        None => AppConfig::load(crate::cli::context::home_dir())?,
    };
    config.with_base_url(api_url)
}

/// Session store in the hsmctl home.
pub fn session_store() -> FileSessionStore {
    FileSessionStore::new(crate::cli::context::home_dir().join("session"))
}

/// API client carrying the stored session (if any) and the session expiry
/// interceptor.
pub fn client(config: &AppConfig) -> Result<ApiClient> {
    let session = session_store().load()?;
    Ok(anonymous_client(config)?.with_session(session))
}

/// API client that sends no session cookie, for logging in. The stored
/// session is left alone until a new one replaces it.
pub fn anonymous_client(config: &AppConfig) -> Result<ApiClient> {
    let client = ApiClient::new(config.api_root(), config.timeout())?
        .with_interceptor(Box::new(SessionExpiryInterceptor::new(session_store())));
    Ok(client)
}

/// API client for endpoints that require a session. Fails fast with
/// `NotLoggedIn` instead of letting the backend answer 401.
pub fn authenticated_client(config: &AppConfig) -> Result<ApiClient> {
    let client = client(config)?;
    if !client.has_session() {
        return Err(HsmError::NotLoggedIn);
    }
    Ok(client)
}

/// Refuse key operations until the HSM is configured and connected.
pub fn ensure_hsm_ready(client: &ApiClient) -> Result<()> {
    let sp = output::spinner("Checking HSM connection...");
    let health = HttpHsmService::new(client).health();
    output::clear_spinner(sp);
    let health = health?;
    if !health.is_ready() {
        return Err(HsmError::HsmNotReady {
            configured: health.configured,
            connected: health.connected,
        });
    }
    Ok(())
}
