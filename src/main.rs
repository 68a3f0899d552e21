use anyhow::{Context, Result};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mtpulse::app::App;
use mtpulse::config::{Config, Settings, SettingsExt};

/// How long exit waits for blocking terminal calls still in flight
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings: file, then environment, then CLI
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.apply_env();
    settings.merge_cli(&cli);
    settings.validate();

    // Run the application
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let app = App::new(settings, cli.is_demo_mode());
    let result = runtime.block_on(app.run());

    // A hung terminal call must not keep the process alive
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("mtpulse=debug,mtpulse_core=debug")
    } else {
        EnvFilter::new("mtpulse=info,mtpulse_core=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
