//! Action methods on [`PulseCore`]: on-demand fetches and lifecycle.

use std::time::Duration;

use tracing::{info, warn};

use crate::accounts::Login;
use crate::live::LiveSubscription;
use crate::monitor::CycleReport;
use crate::snapshot::AccountSnapshot;

use super::core::{PulseCore, RefreshState};
use super::types::ApiError;

/// How long `stop_refresh` waits for the loop before aborting it
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl PulseCore {
    /// Fetch a fresh snapshot straight from the terminal
    ///
    /// Bypasses the cache and does not write to it; only the refresh loop
    /// updates cached entries. Shares the session lock with the loop, so the
    /// two never read each other's account.
    pub async fn fetch_now(&self, login: Login) -> Result<AccountSnapshot, ApiError> {
        let account = self
            .accounts()
            .iter()
            .find(|a| a.login == login)
            .cloned()
            .ok_or(ApiError::AccountNotFound { login })?;

        Ok(self.worker().fetch(account).await?)
    }

    /// Run one refresh cycle now and wait for it
    ///
    /// Serialized with the background loop's cycles.
    pub async fn refresh_now(&self) -> CycleReport {
        let cancel = self.shutdown_token().child_token();
        self.refresher().run_cycle(&cancel).await
    }

    /// Start the background refresh loop
    ///
    /// Can only happen once per core; a second call fails with
    /// [`ApiError::RefreshAlreadyStarted`].
    pub fn start_refresh(&self) -> Result<(), ApiError> {
        let mut state = self.refresh_state().lock();
        if !matches!(*state, RefreshState::Idle) {
            return Err(ApiError::RefreshAlreadyStarted);
        }

        let cancel = self.shutdown_token().child_token();
        let handle = self.refresher().clone().start(cancel.clone());
        *state = RefreshState::Running { cancel, handle };
        Ok(())
    }

    /// Stop the background refresh loop and wait for it to finish
    ///
    /// A no-op if the loop is not running.
    pub async fn stop_refresh(&self) {
        let running = {
            let mut state = self.refresh_state().lock();
            if !matches!(*state, RefreshState::Running { .. }) {
                return;
            }
            std::mem::replace(&mut *state, RefreshState::Stopped)
        };

        if let RefreshState::Running { cancel, mut handle } = running {
            cancel.cancel();
            match tokio::time::timeout(STOP_TIMEOUT, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Refresh loop ended abnormally: {}", e),
                Err(_) => {
                    warn!("Refresh loop did not stop within {:?}; aborting", STOP_TIMEOUT);
                    handle.abort();
                }
            }
        }
    }

    /// Subscribe to the live feed
    ///
    /// Each subscription runs its own ticker over the shared cache and ends
    /// when dropped or when the core shuts down.
    pub fn subscribe_live(&self) -> LiveSubscription {
        self.live().clone().spawn(self.shutdown_token().clone())
    }

    /// Stop everything and close the terminal session
    ///
    /// Safe to call more than once. Never fails: a session close that
    /// outlasts the fetch timeout is abandoned with a warning.
    pub async fn shutdown(&self) {
        if self.shutdown_token().is_cancelled() {
            return;
        }
        info!("Shutting down core");

        self.stop_refresh().await;
        self.shutdown_token().cancel();

        let session = self.session().clone();
        let close = tokio::task::spawn_blocking(move || session.close());
        let limit = self.settings().fetch_timeout() + Duration::from_secs(1);
        match tokio::time::timeout(limit, close).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Terminal close task failed: {}", e),
            Err(_) => warn!("Terminal close did not finish within {:?}", limit),
        }
    }
}
