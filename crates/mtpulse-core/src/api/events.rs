//! Core event system for push-based change notification.
//!
//! The refresh loop reports every account outcome and every finished cycle
//! on a broadcast channel. Consumers call [`PulseCore::subscribe()`] to
//! follow along; events are dropped when nobody listens.

use tokio::sync::broadcast;

use crate::accounts::Login;

use super::core::PulseCore;

/// Events emitted by the core when the cache changes
#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// A fresh snapshot was written to the cache
    SnapshotUpdated {
        /// Account number
        login: Login,
    },

    /// Refreshing an account failed; its cache entry was left as is
    RefreshFailed {
        /// Account number
        login: Login,
        /// Error description
        reason: String,
    },

    /// A refresh cycle finished
    CycleCompleted {
        /// Cycle number, starting at 1
        cycle: u64,
        /// Accounts refreshed
        updated: usize,
        /// Accounts that failed
        failed: usize,
        /// The terminal is disabled and nothing was fetched
        skipped: bool,
    },
}

impl PulseCore {
    /// Subscribe to core events.
    ///
    /// Returns a broadcast receiver that will receive [`CoreEvent`]s.
    /// If the receiver falls behind, older events are dropped (lagged).
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.event_sender().subscribe()
    }
}
