use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use mtpulse_core::config::Settings;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Trading account metrics for dashboards")]
pub struct Config {
    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Seconds between refresh cycles
    #[arg(short = 'r', long)]
    pub refresh_interval: Option<u64>,

    /// Seconds between live stream ticks
    #[arg(short = 'l', long)]
    pub live_interval: Option<u64>,

    /// Web server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path of the JSON account roster
    #[arg(short, long)]
    pub accounts: Option<PathBuf>,

    /// Whether the trading terminal is reachable
    #[arg(long, action = clap::ArgAction::Set)]
    pub terminal_enabled: Option<bool>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve simulated accounts (no terminal required)
    Demo,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check if running in demo mode
    pub fn is_demo_mode(&self) -> bool {
        matches!(self.command, Some(Command::Demo))
    }
}

/// Loading and layering for [`Settings`]
pub trait SettingsExt: Sized {
    /// Load settings from config file or use defaults
    fn load(path: Option<&PathBuf>) -> Result<Self>;

    /// Apply deployment overrides from the environment
    fn apply_env(&mut self);

    /// Merge CLI config into settings (CLI takes precedence)
    fn merge_cli(&mut self, cli: &Config);
}

fn read_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
}

impl SettingsExt for Settings {
    fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return read_file(p);
            }
            tracing::warn!("Config file {:?} not found, using defaults", p);
        }

        let default_paths = [
            dirs::config_dir().map(|p| p.join("mtpulse/config.toml")),
            dirs::home_dir().map(|p| p.join(".mtpulse.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return read_file(path);
            }
        }

        Ok(Self::default())
    }

    fn apply_env(&mut self) {
        if let Ok(enabled) = std::env::var("MT5_ENABLED") {
            self.terminal.enabled = enabled.trim() == "1";
        }

        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.web.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Ok(secs) = std::env::var("REFRESH_INTERVAL_SECONDS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) => self.refresh_interval_secs = secs,
                Err(_) => tracing::warn!("Ignoring REFRESH_INTERVAL_SECONDS={:?}", secs),
            }
        }
    }

    fn merge_cli(&mut self, cli: &Config) {
        if let Some(secs) = cli.refresh_interval {
            self.refresh_interval_secs = secs;
        }
        if let Some(secs) = cli.live_interval {
            self.live_interval_secs = secs;
        }
        if let Some(port) = cli.port {
            self.web.port = port;
        }
        if let Some(accounts) = &cli.accounts {
            self.accounts_file = Some(accounts.clone());
        }
        if let Some(enabled) = cli.terminal_enabled {
            self.terminal.enabled = enabled;
        }
        if cli.is_demo_mode() {
            self.terminal.enabled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ENV_KEYS: [&str; 3] = ["MT5_ENABLED", "CORS_ORIGINS", "REFRESH_INTERVAL_SECONDS"];

    fn without_env<F: FnOnce()>(f: F) {
        temp_env::with_vars_unset(ENV_KEYS, f);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            refresh_interval_secs = 30
            accounts_file = "/srv/accounts.json"

            [terminal]
            enabled = true

            [web]
            port = 9000
        "#;

        let settings: Settings = toml::from_str(toml).expect("Should parse TOML");
        assert_eq!(settings.refresh_interval_secs, 30);
        assert_eq!(settings.live_interval_secs, 5);
        assert_eq!(
            settings.accounts_file,
            Some(PathBuf::from("/srv/accounts.json"))
        );
        assert!(settings.terminal.enabled);
        assert_eq!(settings.terminal.fetch_timeout_secs, 30);
        assert_eq!(settings.web.port, 9000);
        assert_eq!(settings.web.host, "127.0.0.1");
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "live_interval_secs = 2\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.live_interval_secs, 2);
        assert_eq!(settings.refresh_interval_secs, 10);
    }

    #[test]
    fn test_load_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh_interval_secs = \"soon\"\n").unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                ("MT5_ENABLED", Some("1")),
                ("CORS_ORIGINS", Some("https://a.example, https://b.example,")),
                ("REFRESH_INTERVAL_SECONDS", Some("3")),
            ],
            || {
                let mut settings = Settings::default();
                settings.apply_env();

                assert!(settings.terminal.enabled);
                assert_eq!(
                    settings.web.cors_origins,
                    vec!["https://a.example", "https://b.example"]
                );
                assert_eq!(settings.refresh_interval_secs, 3);
            },
        );
    }

    #[test]
    fn test_env_disables_terminal_and_ignores_bad_interval() {
        temp_env::with_vars(
            [
                ("MT5_ENABLED", Some("0")),
                ("CORS_ORIGINS", None),
                ("REFRESH_INTERVAL_SECONDS", Some("often")),
            ],
            || {
                let mut settings = Settings::default();
                settings.terminal.enabled = true;
                settings.apply_env();

                assert!(!settings.terminal.enabled);
                assert_eq!(settings.refresh_interval_secs, 10);
                assert_eq!(settings.web.cors_origins, vec!["http://localhost:5173"]);
            },
        );
    }

    #[test]
    fn test_env_absent_keeps_file_values() {
        without_env(|| {
            let mut settings: Settings = toml::from_str("refresh_interval_secs = 42").unwrap();
            settings.apply_env();
            assert_eq!(settings.refresh_interval_secs, 42);
            assert!(!settings.terminal.enabled);
        });
    }

    #[test]
    fn test_cli_overrides_env_and_file() {
        temp_env::with_vars(
            [
                ("MT5_ENABLED", Some("1")),
                ("CORS_ORIGINS", None),
                ("REFRESH_INTERVAL_SECONDS", Some("20")),
            ],
            || {
                let mut settings: Settings =
                    toml::from_str("refresh_interval_secs = 60\nlive_interval_secs = 9").unwrap();
                settings.apply_env();
                assert_eq!(settings.refresh_interval_secs, 20);

                let cli = Config::parse_from([
                    "mtpulse",
                    "--refresh-interval",
                    "7",
                    "--terminal-enabled",
                    "false",
                    "--port",
                    "8100",
                ]);
                settings.merge_cli(&cli);

                assert_eq!(settings.refresh_interval_secs, 7);
                assert_eq!(settings.live_interval_secs, 9);
                assert!(!settings.terminal.enabled);
                assert_eq!(settings.web.port, 8100);
            },
        );
    }

    #[test]
    fn test_demo_subcommand_enables_terminal() {
        let cli = Config::parse_from(["mtpulse", "demo", "--debug"]);
        assert!(cli.is_demo_mode());
        assert!(cli.debug);

        let mut settings = Settings::default();
        settings.merge_cli(&cli);
        assert!(settings.terminal.enabled);
    }

    #[test]
    fn test_accounts_flag() {
        let cli = Config::parse_from(["mtpulse", "--accounts", "roster.json"]);
        let mut settings = Settings::default();
        settings.merge_cli(&cli);
        assert_eq!(settings.accounts_file, Some(PathBuf::from("roster.json")));
        assert!(!cli.is_demo_mode());
    }
}
