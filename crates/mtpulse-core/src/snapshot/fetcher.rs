use std::sync::Arc;

use chrono::Utc;

use super::error::FetchError;
use super::types::AccountSnapshot;
use crate::accounts::Account;
use crate::terminal::TerminalSession;

/// Produces a snapshot of one account through the shared terminal session
///
/// [`fetch_snapshot`](Self::fetch_snapshot) blocks on terminal IO; async
/// callers go through [`FetchWorker`](super::FetchWorker).
#[derive(Clone)]
pub struct SnapshotFetcher {
    session: Arc<TerminalSession>,
}

impl SnapshotFetcher {
    pub fn new(session: Arc<TerminalSession>) -> Self {
        Self { session }
    }

    /// The session this fetcher drives
    pub fn session(&self) -> &Arc<TerminalSession> {
        &self.session
    }

    /// Fetch a snapshot of `account` as of now
    ///
    /// Terminal switch, login and the account read all happen under one
    /// session lock, so a concurrent fetch for another account cannot swap
    /// the login in between.
    pub fn fetch_snapshot(&self, account: &Account) -> Result<AccountSnapshot, FetchError> {
        let mut session = self.session.lock();
        session.ensure_terminal(&account.terminal_path)?;
        session.ensure_login(account.login, account.password(), &account.server)?;

        let info = session
            .account_info()?
            .ok_or_else(|| FetchError::NoData {
                login: account.login,
                reason: session.last_error(),
            })?;
        let timestamp = Utc::now();

        let currency = if account.currency.is_empty() {
            info.currency
        } else {
            account.currency.clone()
        };

        Ok(AccountSnapshot {
            label: account.label.clone(),
            login: account.login,
            balance: info.balance,
            equity: info.equity,
            margin: info.margin,
            margin_free: info.margin_free,
            margin_level: info.margin_level,
            profit: info.profit,
            currency,
            server: account.server.clone(),
            timestamp,
        })
    }
}
