//! Read-only query methods on [`PulseCore`].
//!
//! Queries only read the snapshot cache; they never touch the terminal.

use crate::accounts::Login;
use crate::snapshot::AccountSnapshot;

use super::core::PulseCore;
use super::types::{AccountOverview, ApiError};

impl PulseCore {
    /// All tracked accounts with their cached snapshots, in label order
    pub fn list_accounts(&self) -> Vec<AccountOverview> {
        self.accounts()
            .iter()
            .map(|a| AccountOverview::new(a, self.cache().get(a.login)))
            .collect()
    }

    /// One tracked account with its cached snapshot
    pub fn get_account(&self, login: Login) -> Result<AccountOverview, ApiError> {
        self.accounts()
            .iter()
            .find(|a| a.login == login)
            .map(|a| AccountOverview::new(a, self.cache().get(login)))
            .ok_or(ApiError::AccountNotFound { login })
    }

    /// The cached snapshot of a tracked account
    pub fn cached_snapshot(&self, login: Login) -> Result<AccountSnapshot, ApiError> {
        if !self.is_tracked(login) {
            return Err(ApiError::AccountNotFound { login });
        }
        self.cache()
            .get(login)
            .ok_or(ApiError::NotCached { login })
    }

    /// Whether `login` is in the tracked set
    pub fn is_tracked(&self, login: Login) -> bool {
        self.accounts().iter().any(|a| a.login == login)
    }

    /// Number of tracked accounts
    pub fn account_count(&self) -> usize {
        self.accounts().len()
    }

    /// Whether the terminal can be reached at all
    pub fn is_enabled(&self) -> bool {
        self.session().is_enabled()
    }

    /// Whether the background refresh loop is currently running
    pub fn is_refreshing(&self) -> bool {
        matches!(
            *self.refresh_state().lock(),
            super::core::RefreshState::Running { .. }
        )
    }
}
