//! Configuration loaded from `~/.config/vscompare/config.toml`.
//!
//! Every key is optional; a missing file yields the defaults. The backend URL
//! can also come from `VSCOMPARE_BACKEND_URL`, and CLI flags beat both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::DEFAULT_BASE_URL;
use crate::api::{BackendClient, SummarizeParams};
use crate::compare::{
    CorrelationStrategy, Layout, SessionOptions, ACTIVE_WINDOW, CORRELATION_WINDOW,
};

/// Environment variable overriding `[backend] base_url`
pub const BACKEND_URL_ENV: &str = "VSCOMPARE_BACKEND_URL";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub compare: CompareConfig,
    pub summarization: SummarizationConfig,
}

/// `[backend]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// `[compare]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Seconds within which same-typed events correlate
    pub correlation_window: f64,
    /// Seconds within which an event counts as active (highlighting only)
    pub active_window: f64,
    pub layout: Layout,
    /// Fill streams that have no events with placeholder detections
    pub mock_events: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            correlation_window: CORRELATION_WINDOW,
            active_window: ACTIVE_WINDOW,
            layout: Layout::default(),
            mock_events: false,
        }
    }
}

/// `[summarization]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationConfig {
    /// Seconds of video per caption chunk
    pub chunk_duration: u32,
    pub prompt: String,
    pub system_prompt: String,
    pub caption_summarization_prompt: String,
    pub summary_aggregation_prompt: String,
    pub enable_chat: bool,
    pub enable_chat_history: bool,
    pub enable_audio: bool,
    pub model: String,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            chunk_duration: 10,
            prompt: "Describe the key events in this video, noting people, vehicles and \
                     anything unusual."
                .to_string(),
            system_prompt: "You are a video analysis assistant.".to_string(),
            caption_summarization_prompt: String::new(),
            summary_aggregation_prompt: String::new(),
            enable_chat: true,
            enable_chat_history: true,
            enable_audio: false,
            model: "vila-1.5".to_string(),
        }
    }
}

impl Config {
    /// Load from `path` (default location when `None`), then apply the
    /// environment override.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load_from(&config_path())?,
        };
        config.apply_env(std::env::var(BACKEND_URL_ENV).ok());
        Ok(config)
    }

    /// Load from `path`; defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid TOML in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.backend.timeout_secs == 0 {
            anyhow::bail!("backend.timeout_secs must be at least 1");
        }
        let c = &self.compare;
        if !(c.correlation_window.is_finite() && c.correlation_window >= 0.0) {
            anyhow::bail!("compare.correlation_window must be a non-negative number");
        }
        if !(c.active_window.is_finite() && c.active_window >= 0.0) {
            anyhow::bail!("compare.active_window must be a non-negative number");
        }
        Ok(())
    }

    fn apply_env(&mut self, backend_url: Option<String>) {
        if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
            debug!("Backend URL from {BACKEND_URL_ENV}: {url}");
            self.backend.base_url = url;
        }
    }

    /// Session options derived from `[compare]`
    #[must_use]
    pub fn session_options(&self, strategy: CorrelationStrategy) -> SessionOptions {
        SessionOptions {
            correlation_window: self.compare.correlation_window,
            active_window: self.compare.active_window,
            strategy,
            layout: self.compare.layout,
            mock_events: self.compare.mock_events,
        }
    }

    /// Summarize request for `file_id` from `[summarization]`
    #[must_use]
    pub fn summarize_params(&self, file_id: &str) -> SummarizeParams {
        let s = &self.summarization;
        SummarizeParams {
            model: s.model.clone(),
            chunk_duration: Some(s.chunk_duration),
            prompt: Some(s.prompt.clone()).filter(|p| !p.is_empty()),
            caption_summarization_prompt: s.caption_summarization_prompt.clone(),
            summary_aggregation_prompt: s.summary_aggregation_prompt.clone(),
            enable_chat: s.enable_chat,
            enable_chat_history: s.enable_chat_history,
            enable_audio: s.enable_audio,
            ..SummarizeParams::new(file_id)
        }
    }

    /// Backend client for `[backend]`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn backend_client(&self) -> Result<BackendClient> {
        BackendClient::with_timeout(
            &self.backend.base_url,
            Duration::from_secs(self.backend.timeout_secs),
        )
        .with_context(|| format!("invalid backend URL {}", self.backend.base_url))
    }
}

/// Return the path to the config file.
#[must_use]
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vscompare")
        .join("config.toml")
}
