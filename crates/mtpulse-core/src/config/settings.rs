use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application settings (from config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between refresh cycles
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Seconds between live stream ticks
    #[serde(default = "default_live_interval")]
    pub live_interval_secs: u64,

    /// Path of the JSON account roster
    #[serde(default)]
    pub accounts_file: Option<PathBuf>,

    /// Terminal settings
    #[serde(default)]
    pub terminal: TerminalSettings,

    /// Web server settings
    #[serde(default)]
    pub web: WebSettings,
}

fn default_refresh_interval() -> u64 {
    10
}

fn default_live_interval() -> u64 {
    5
}

/// Trading terminal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Whether a terminal is reachable from this deployment
    #[serde(default)]
    pub enabled: bool,

    /// Give up on a single fetch after this many seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Blocking threads allowed to wait on the terminal at once
    #[serde(default = "default_fetch_workers")]
    pub fetch_workers: usize,
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_fetch_workers() -> usize {
    2
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            fetch_timeout_secs: default_fetch_timeout(),
            fetch_workers: default_fetch_workers(),
        }
    }
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSettings {
    /// Bind address
    #[serde(default = "default_web_host")]
    pub host: String,

    /// Web server port
    #[serde(default = "default_web_port")]
    pub port: u16,

    /// Origins allowed to call the API from a browser
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_web_host() -> String {
    "127.0.0.1".to_string()
}

fn default_web_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            live_interval_secs: default_live_interval(),
            accounts_file: None,
            terminal: TerminalSettings::default(),
            web: WebSettings::default(),
        }
    }
}

impl Settings {
    /// Validate and normalize settings values
    ///
    /// Intervals, the fetch timeout and the worker count are at least 1.
    pub fn validate(&mut self) {
        self.refresh_interval_secs = self.refresh_interval_secs.max(1);
        self.live_interval_secs = self.live_interval_secs.max(1);
        self.terminal.fetch_timeout_secs = self.terminal.fetch_timeout_secs.max(1);
        self.terminal.fetch_workers = self.terminal.fetch_workers.max(1);
        self.web.cors_origins.retain(|o| !o.trim().is_empty());
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn live_interval(&self) -> Duration {
        Duration::from_secs(self.live_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.terminal.fetch_timeout_secs)
    }
}
