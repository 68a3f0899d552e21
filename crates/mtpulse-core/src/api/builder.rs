//! Builder for constructing a [`PulseCore`] instance.
//!
//! ```ignore
//! let core = PulseCoreBuilder::new(settings)
//!     .with_accounts(accounts)
//!     .with_terminal(Box::new(terminal))
//!     .build();
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::accounts::{sort_accounts, Account};
use crate::cache::{SharedCache, SnapshotCache};
use crate::config::Settings;
use crate::live::LiveStream;
use crate::monitor::Refresher;
use crate::snapshot::{FetchWorker, SnapshotFetcher};
use crate::terminal::{TerminalCapability, TerminalSession};

use super::core::PulseCore;

/// Builder for constructing a [`PulseCore`] Facade instance
pub struct PulseCoreBuilder {
    settings: Arc<Settings>,
    accounts: Vec<Account>,
    terminal: Option<Box<dyn TerminalCapability>>,
    cache: Option<SharedCache>,
    refresh_interval: Option<Duration>,
    live_interval: Option<Duration>,
}

impl PulseCoreBuilder {
    /// Create a new builder with the given settings
    pub fn new(settings: Settings) -> Self {
        Self::from_shared_settings(Arc::new(settings))
    }

    /// Create a new builder from an already-shared settings
    pub fn from_shared_settings(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            accounts: Vec::new(),
            terminal: None,
            cache: None,
            refresh_interval: None,
            live_interval: None,
        }
    }

    /// Set the tracked accounts (any order; they are sorted by label)
    pub fn with_accounts(mut self, accounts: Vec<Account>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Set the terminal capability
    ///
    /// Ignored unless `terminal.enabled` is set in the settings.
    pub fn with_terminal(mut self, terminal: Box<dyn TerminalCapability>) -> Self {
        self.terminal = Some(terminal);
        self
    }

    /// Use an existing shared cache instead of creating a new one
    pub fn with_cache(mut self, cache: SharedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the refresh interval from settings
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Override the live tick interval from settings
    pub fn with_live_interval(mut self, interval: Duration) -> Self {
        self.live_interval = Some(interval);
        self
    }

    /// Build the `PulseCore` instance
    ///
    /// Without a terminal, or with the terminal disabled in settings, the
    /// session is created disabled and every fetch reports `Unavailable`.
    pub fn build(self) -> PulseCore {
        let settings = self.settings;

        let session = match self.terminal {
            Some(terminal) if settings.terminal.enabled => TerminalSession::new(terminal),
            Some(_) => {
                tracing::info!("Terminal configured but disabled in settings");
                TerminalSession::disabled()
            }
            None => TerminalSession::disabled(),
        };
        let session = Arc::new(session);

        let accounts = Arc::new(sort_accounts(self.accounts));
        let cache = self.cache.unwrap_or_else(SnapshotCache::shared);
        let worker = FetchWorker::new(
            SnapshotFetcher::new(session.clone()),
            settings.terminal.fetch_workers,
            settings.fetch_timeout(),
        );
        let event_tx = PulseCore::event_channel();

        let refresher = Arc::new(Refresher::new(
            accounts.clone(),
            worker.clone(),
            cache.clone(),
            self.refresh_interval
                .unwrap_or_else(|| settings.refresh_interval()),
            event_tx.clone(),
        ));

        let logins = Arc::new(accounts.iter().map(|a| a.login).collect());
        let live = LiveStream::new(
            cache.clone(),
            logins,
            self.live_interval.unwrap_or_else(|| settings.live_interval()),
        );

        PulseCore::new(
            settings, accounts, session, worker, cache, refresher, live, event_tx,
        )
    }
}
