//! Test-run configuration.
//!
//! Resolution order: built-in defaults, then a YAML file named by
//! `CANVAS_E2E_CONFIG` (if set), then individual environment variables.

use crate::browser::BrowserConfig;
use crate::keyboard::Platform;
use crate::logging::LogConfig;
use crate::result::{E2eError, E2eResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default editor origin
pub const DEFAULT_BASE_URL: &str = "http://darklang.localhost:9000";

/// Default suffix of user-handler hosts (`test-<title>` is prepended)
pub const DEFAULT_BWD_BASE_URL: &str = ".builtwithdark.localhost:11001";

/// Environment variable naming a YAML config file
pub const ENV_CONFIG_FILE: &str = "CANVAS_E2E_CONFIG";
/// Environment variable overriding [`E2eConfig::base_url`]
pub const ENV_BASE_URL: &str = "CANVAS_E2E_BASE_URL";
/// Environment variable overriding [`E2eConfig::bwd_base_url`]
pub const ENV_BWD_BASE_URL: &str = "CANVAS_E2E_BWD_BASE_URL";
/// Environment variable overriding headless mode
pub const ENV_HEADLESS: &str = "CANVAS_E2E_HEADLESS";
/// Environment variable pointing at the chromium binary
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";

/// Configuration of an end-to-end run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    /// Editor origin, e.g. `http://darklang.localhost:9000`
    pub base_url: String,
    /// Host suffix for user handlers, e.g. `.builtwithdark.localhost:11001`
    pub bwd_base_url: String,
    /// Browser launch settings
    pub browser: BrowserConfig,
    /// Wait and expectation timeouts
    pub wait: WaitOptions,
    /// Shortcut convention override (default: the host OS)
    pub platform: Option<Platform>,
    /// Log output settings
    pub log: LogConfig,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bwd_base_url: DEFAULT_BWD_BASE_URL.to_string(),
            browser: BrowserConfig::default(),
            wait: WaitOptions::default(),
            platform: None,
            log: LogConfig::default(),
        }
    }
}

impl E2eConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> E2eResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> E2eResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Defaults, then `CANVAS_E2E_CONFIG`, then environment overrides
    pub fn from_env() -> E2eResult<Self> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// [`Self::from_env`] with an injectable variable lookup
    pub fn resolve<F>(lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match lookup(ENV_CONFIG_FILE) {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides(lookup)
    }

    /// Apply the individual environment overrides
    pub fn with_env_overrides<F>(mut self, lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(url) = lookup(ENV_BWD_BASE_URL) {
            self.bwd_base_url = url;
        }
        if let Some(flag) = lookup(ENV_HEADLESS) {
            self.browser.headless = parse_bool(ENV_HEADLESS, &flag)?;
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH) {
            self.browser.chromium_path = Some(path);
        }
        self.validate()?;
        Ok(self)
    }

    /// Check invariants the helpers rely on
    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(config_error(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.bwd_base_url.is_empty() || self.bwd_base_url.contains('/') {
            return Err(config_error(format!(
                "bwd_base_url must be a host suffix like .builtwithdark.localhost:11001, got {:?}",
                self.bwd_base_url
            )));
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(config_error("wait.poll_interval_ms must be positive"));
        }
        Ok(())
    }

    /// Shortcut convention for this run
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_default()
    }
}

fn config_error(message: impl Into<String>) -> E2eError {
    E2eError::Config {
        message: message.into(),
    }
}

fn parse_bool(key: &str, value: &str) -> E2eResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(config_error(format!("{key} must be a boolean, got {other:?}"))),
    }
}
