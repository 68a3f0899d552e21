mod settings;

pub use settings::{Settings, TerminalSettings, WebSettings};
