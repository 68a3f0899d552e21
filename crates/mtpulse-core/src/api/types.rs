//! Owned types returned by the Facade API.

use serde::Serialize;
use thiserror::Error;

use crate::accounts::{Account, Login};
use crate::snapshot::{AccountSnapshot, ErrorKind, FetchError};

/// Error type for Facade API operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// The login is not in the tracked set
    #[error("account not found: {login}")]
    AccountNotFound { login: Login },

    /// The account is tracked but has never been fetched successfully
    #[error("no snapshot cached for {login}")]
    NotCached { login: Login },

    /// The refresh loop was already started once
    #[error("refresh loop already started")]
    RefreshAlreadyStarted,

    /// Fetching from the terminal failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ApiError {
    /// Classify the error for transports
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::AccountNotFound { .. } | ApiError::NotCached { .. } => ErrorKind::NotFound,
            ApiError::RefreshAlreadyStarted => ErrorKind::Internal,
            ApiError::Fetch(e) => e.kind(),
        }
    }
}

/// A tracked account with its cached snapshot, if any
///
/// Never carries the password.
#[derive(Debug, Clone, Serialize)]
pub struct AccountOverview {
    pub label: String,
    pub login: Login,
    /// Login as a string, the key dashboards address accounts by
    pub login_hint: String,
    pub server: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_size: Option<f64>,
    pub snapshot: Option<AccountSnapshot>,
}

impl AccountOverview {
    pub fn new(account: &Account, snapshot: Option<AccountSnapshot>) -> Self {
        Self {
            label: account.label.clone(),
            login: account.login,
            login_hint: account.login_hint(),
            server: account.server.clone(),
            currency: account.currency.clone(),
            account_size: account.account_size,
            snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_has_no_password() {
        let account = Account::new("Main", 12, "Broker", "t", "topsecret").with_currency("USD");
        let json = serde_json::to_string(&AccountOverview::new(&account, None)).unwrap();
        assert!(!json.contains("topsecret"));
        assert!(json.contains(r#""login_hint":"12""#));
        assert!(json.contains(r#""snapshot":null"#));
        assert!(!json.contains("account_size"));
    }

    #[test]
    fn test_api_error_kind() {
        assert_eq!(
            ApiError::AccountNotFound { login: 1 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ApiError::from(FetchError::Unavailable).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            ApiError::from(FetchError::Unavailable).to_string(),
            "terminal is disabled on this deployment"
        );
    }
}
