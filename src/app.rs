//! Process lifecycle: wire the core, serve HTTP, shut down on Ctrl-C

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use mtpulse_core::accounts::{load_accounts, Account};
use mtpulse_core::config::Settings;
use mtpulse_core::terminal::{demo_accounts, DemoTerminal, TerminalCapability};
use mtpulse_core::{PulseCore, PulseCoreBuilder};

use crate::web::WebServer;

/// Roster file used when none is configured
const DEFAULT_ACCOUNTS_FILE: &str = "accounts.json";

/// The running service
pub struct App {
    settings: Settings,
    demo: bool,
}

impl App {
    pub fn new(settings: Settings, demo: bool) -> Self {
        Self { settings, demo }
    }

    /// Resolve the tracked accounts and the terminal capability
    fn roster(&self) -> Result<(Vec<Account>, Option<Box<dyn TerminalCapability>>)> {
        if self.demo {
            let accounts = demo_accounts();
            let terminal = DemoTerminal::new(&accounts);
            return Ok((accounts, Some(Box::new(terminal))));
        }

        if !self.settings.terminal.enabled {
            tracing::info!("Terminal disabled, tracking no accounts");
            return Ok((Vec::new(), None));
        }

        let path = self
            .settings
            .accounts_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ACCOUNTS_FILE));
        let accounts = load_accounts(&path)
            .with_context(|| format!("Failed to load accounts from {:?}", path))?;
        tracing::warn!(
            "No terminal bridge is linked into this binary; {} accounts will report unavailable",
            accounts.len()
        );
        Ok((accounts, None))
    }

    /// Build the core from the current settings
    pub fn build_core(&self) -> Result<PulseCore> {
        let (accounts, terminal) = self.roster()?;
        let mut builder = PulseCoreBuilder::new(self.settings.clone()).with_accounts(accounts);
        if let Some(terminal) = terminal {
            builder = builder.with_terminal(terminal);
        }
        Ok(builder.build())
    }

    /// Run until Ctrl-C, then stop the server and the core
    pub async fn run(self) -> Result<()> {
        let core = Arc::new(self.build_core()?);
        tracing::info!(
            "Tracking {} accounts (terminal {})",
            core.account_count(),
            if core.is_enabled() { "enabled" } else { "disabled" }
        );

        core.start_refresh()?;

        let shutdown = CancellationToken::new();
        let mut server =
            WebServer::new(self.settings.web.clone(), core.clone()).start(shutdown.clone());

        let joined = tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                }
                tracing::info!("Shutting down");
                shutdown.cancel();
                None
            }
            joined = &mut server => Some(joined),
        };
        let joined = match joined {
            Some(joined) => joined,
            None => server.await,
        };

        core.shutdown().await;
        joined.context("Web server task panicked")?
    }
}
