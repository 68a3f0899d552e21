//! PulseCore: the Facade entry-point for all consumers (web, tests, embedders)
//!
//! This struct owns every shared service and exposes high-level methods.
//! Consumers never need to acquire locks or wire services themselves.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::accounts::Account;
use crate::cache::SharedCache;
use crate::config::Settings;
use crate::live::LiveStream;
use crate::monitor::Refresher;
use crate::snapshot::FetchWorker;
use crate::terminal::TerminalSession;

use super::events::CoreEvent;

/// Default broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle of the background refresh loop
pub(crate) enum RefreshState {
    /// Never started
    Idle,
    /// Running in a background task
    Running {
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    },
    /// Started once and since stopped
    Stopped,
}

/// The Facade that wraps all mtpulse-core services.
///
/// Constructed via [`PulseCoreBuilder`](super::builder::PulseCoreBuilder).
pub struct PulseCore {
    /// Application settings
    settings: Arc<Settings>,
    /// Tracked accounts in refresh order
    accounts: Arc<Vec<Account>>,
    /// The single terminal session
    session: Arc<TerminalSession>,
    /// Blocking fetch dispatcher
    worker: FetchWorker,
    /// Latest snapshot per account
    cache: SharedCache,
    /// Cycle runner shared with the background loop
    refresher: Arc<Refresher>,
    /// Template for live subscriptions
    live: LiveStream,
    /// Broadcast sender for core events
    event_tx: broadcast::Sender<CoreEvent>,
    /// Cancelled once at shutdown; parent of every background task's token
    shutdown: CancellationToken,
    /// Background refresh loop state
    refresh: Mutex<RefreshState>,
}

impl PulseCore {
    /// Create a new PulseCore instance (prefer `PulseCoreBuilder`)
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        settings: Arc<Settings>,
        accounts: Arc<Vec<Account>>,
        session: Arc<TerminalSession>,
        worker: FetchWorker,
        cache: SharedCache,
        refresher: Arc<Refresher>,
        live: LiveStream,
        event_tx: broadcast::Sender<CoreEvent>,
    ) -> Self {
        Self {
            settings,
            accounts,
            session,
            worker,
            cache,
            refresher,
            live,
            event_tx,
            shutdown: CancellationToken::new(),
            refresh: Mutex::new(RefreshState::Idle),
        }
    }

    /// Create the broadcast channel used for core events
    pub(crate) fn event_channel() -> broadcast::Sender<CoreEvent> {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        event_tx
    }

    /// Access application settings (read-only)
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Access the shared snapshot cache
    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Access the terminal session
    pub fn session(&self) -> &Arc<TerminalSession> {
        &self.session
    }

    // =========================================================
    // Internal accessors for query/action impls
    // =========================================================

    pub(crate) fn accounts(&self) -> &Arc<Vec<Account>> {
        &self.accounts
    }

    pub(crate) fn worker(&self) -> &FetchWorker {
        &self.worker
    }

    pub(crate) fn refresher(&self) -> &Arc<Refresher> {
        &self.refresher
    }

    pub(crate) fn live(&self) -> &LiveStream {
        &self.live
    }

    pub(crate) fn event_sender(&self) -> &broadcast::Sender<CoreEvent> {
        &self.event_tx
    }

    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub(crate) fn refresh_state(&self) -> &Mutex<RefreshState> {
        &self.refresh
    }
}
