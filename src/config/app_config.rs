use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::errors::{HsmError, Result};
use crate::core::services::list_state::DEFAULT_PAGE_SIZE;

/// Path prefix of every backend endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Top-level configuration read from `config.toml` in the hsmctl home.
///
/// Every section is optional; a missing file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub keys: KeysSection,
}

impl AppConfig {
    /// Load `{home}/config.toml`, falling back to defaults when it does not exist.
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = home.join("config.toml");
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_file(&config_path)
    }

    /// Load an explicitly named config file. A missing file is an error.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HsmError::InvalidConfig {
                detail: format!("{} not found", path.display()),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| HsmError::InvalidConfig {
            detail: format!("Failed to parse {}: {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validate_base_url(&self.api.base_url)?;
        if self.api.timeout_secs == 0 {
            return Err(HsmError::InvalidConfig {
                detail: "[api] timeout_secs must be at least 1".into(),
            });
        }
        if self.keys.page_size == 0 {
            return Err(HsmError::InvalidConfig {
                detail: "[keys] page_size must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Override the base URL (from `--api-url` / `HSMCTL_API_URL`).
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Result<Self> {
        if let Some(url) = base_url {
            validate_base_url(url)?;
            self.api.base_url = url.to_string();
        }
        Ok(self)
    }

    /// Root of the versioned API, e.g. `http://localhost:8000/api/v1`.
    pub fn api_root(&self) -> String {
        format!("{}{API_PREFIX}", self.api.base_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

fn validate_base_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(HsmError::InvalidConfig {
            detail: format!("API base URL must start with http:// or https://, got '{url}'"),
        })
    }
}

/// The `[api]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// The `[keys]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct KeysSection {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for KeysSection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
