mod settings;

pub use mtpulse_core::config::{Settings, TerminalSettings, WebSettings};
pub use settings::{Command, Config, SettingsExt};
