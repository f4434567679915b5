//! Configuration management for plate-checker
//!
//! Config stored at: ~/.config/plate-checker/config.json

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::{default_available_patterns, default_unavailable_patterns, Classifier};
use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::query::RetryPolicy;
use crate::session::SessionConfig;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// WebDriver endpoint (chromedriver)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Entry point of the plate query surface
    #[serde(default = "default_entry_url")]
    pub entry_url: String,

    /// Run the browser without a visible window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Maximum wait per session operation, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per plate on transient failures, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between attempts, in seconds
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Pause between batch queries, in seconds
    #[serde(default = "default_query_delay_secs")]
    pub query_delay_secs: u64,

    /// User agent override (optional)
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Response phrases meaning the plate is taken; matched before the
    /// available phrases
    #[serde(default = "default_unavailable_patterns")]
    pub unavailable_patterns: Vec<String>,

    /// Response phrases meaning the plate can be registered
    #[serde(default = "default_available_patterns")]
    pub available_patterns: Vec<String>,
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_entry_url() -> String {
    "https://ezyplates.sa.gov.au/".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_secs() -> u64 {
    2
}

fn default_query_delay_secs() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            entry_url: default_entry_url(),
            headless: true,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_secs: default_backoff_secs(),
            query_delay_secs: default_query_delay_secs(),
            user_agent: None,
            output_format: OutputFormat::default(),
            unavailable_patterns: default_unavailable_patterns(),
            available_patterns: default_available_patterns(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?
            .join("plate-checker");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            webdriver_url: self.webdriver_url.clone(),
            entry_url: self.entry_url.clone(),
            headless: self.headless,
            timeout: self.timeout(),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.max(1),
            backoff: Duration::from_secs(self.backoff_secs),
        }
    }

    pub fn query_delay(&self) -> Duration {
        Duration::from_secs(self.query_delay_secs)
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::from_patterns(&self.unavailable_patterns, &self.available_patterns)
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Plate Checker Configuration")?;
        writeln!(f, "===========================")?;
        writeln!(f)?;
        writeln!(f, "WebDriver URL:   {}", self.webdriver_url)?;
        writeln!(f, "Entry URL:       {}", self.entry_url)?;
        writeln!(f, "Headless:        {}", self.headless)?;
        writeln!(f, "Timeout:         {}s", self.timeout_secs)?;
        writeln!(f, "Max retries:     {}", self.max_retries)?;
        writeln!(f, "Backoff:         {}s", self.backoff_secs)?;
        writeln!(f, "Query delay:     {}s", self.query_delay_secs)?;
        writeln!(
            f,
            "User agent:      {}",
            self.user_agent.as_deref().unwrap_or("(default)")
        )?;
        writeln!(f, "Output format:   {}", self.output_format)?;
        writeln!(
            f,
            "Unavailable if:  {}",
            self.unavailable_patterns.join(" | ")
        )?;
        writeln!(f, "Available if:    {}", self.available_patterns.join(" | "))?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:     {}", path.display())?;
        }

        Ok(())
    }
}
