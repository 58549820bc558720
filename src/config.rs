//! Configuration loaded from `~/.config/factcue/config.toml`.
//!
//! Every section is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [store]
//! owner = "factcheck47"
//! repo = "video-fact-checker"
//!
//! [poll]
//! max_attempts = 60
//! interval_ms = 5000
//!
//! [overlay]
//! window_secs = 3.0
//! sample_interval_ms = 500
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Where result documents live and how their addresses are built.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL serving raw repository content
    pub raw_base_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Directory holding one `<video_id>.json` per video
    pub results_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            owner: "factcheck47".to_string(),
            repo: "video-fact-checker".to_string(),
            branch: "main".to_string(),
            results_dir: "results".to_string(),
        }
    }
}

/// Settings for the user-mediated work-item link.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Base URL of the web front-end hosting the repository
    pub web_base_url: String,
    /// References longer than this are refused
    pub max_url_len: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            web_base_url: "https://github.com".to_string(),
            max_url_len: 8000,
        }
    }
}

/// Fixed-interval polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval_ms: 5000,
        }
    }
}

impl PollConfig {
    #[must_use]
    pub fn new(max_attempts: u32, interval_ms: u64) -> Self {
        Self {
            max_attempts,
            interval_ms,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Overlay display window and sampling rate.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Half-width of the display window around each claim, in seconds
    pub window_secs: f64,
    pub sample_interval_ms: u64,
    /// Explanation characters shown in a bubble before truncation
    pub explanation_limit: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            window_secs: 3.0,
            sample_interval_ms: 500,
            explanation_limit: 100,
        }
    }
}

impl OverlayConfig {
    #[must_use]
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            timeout_secs: 30,
            user_agent: format!("factcue/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub trigger: TriggerConfig,
    pub poll: PollConfig,
    pub overlay: OverlayConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load from the default location.
    ///
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from an explicit path, falling back to defaults if it is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Self::from_toml(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    #[must_use]
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    #[must_use]
    pub fn with_overlay(mut self, overlay: OverlayConfig) -> Self {
        self.overlay = overlay;
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: TriggerConfig) -> Self {
        self.trigger = trigger;
        self
    }
}

/// Return the path to the config file.
fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("factcue")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.poll, PollConfig::default());
        assert_eq!(config.store.owner, "factcheck47");
        assert_eq!(config.overlay.sample_interval_ms, 500);
    }

    #[test]
    fn parse_partial_sections() {
        let toml_str = r#"
[store]
owner = "someone"

[poll]
interval_ms = 250

[overlay]
window_secs = 5.0
"#;
        let config = Config::from_toml(toml_str).unwrap();
        assert_eq!(config.store.owner, "someone");
        assert_eq!(config.store.repo, "video-fact-checker");
        assert_eq!(config.poll.max_attempts, 60);
        assert_eq!(config.poll.interval(), Duration::from_millis(250));
        assert!((config.overlay.window_secs - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.overlay.explanation_limit, 100);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(Config::from_toml("[poll]\nmax_attempts = \"many\"").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/factcue/config.toml")).unwrap();
        assert_eq!(config.trigger.max_url_len, 8000);
    }
}
