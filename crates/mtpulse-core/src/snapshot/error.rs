use std::time::Duration;

use thiserror::Error;

use crate::accounts::Login;

/// Why a snapshot could not be produced
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// The terminal capability is disabled for this process
    #[error("terminal is disabled on this deployment")]
    Unavailable,

    /// The terminal could not be initialized
    #[error("terminal initialize failed: {reason}")]
    InitFailed { reason: String },

    /// The terminal rejected the login
    #[error("login failed for {login}: {reason}")]
    LoginFailed { login: Login, reason: String },

    /// The session is fine but the terminal returned no account data
    #[error("no account data for {login}: {reason}")]
    NoData { login: Login, reason: String },

    /// The terminal did not answer in time
    #[error("fetch for {login} timed out after {after:?}")]
    Timeout { login: Login, after: Duration },

    /// The blocking worker panicked or was cancelled
    #[error("fetch worker failed: {0}")]
    Worker(String),
}

/// Coarse classification used by transports to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retrying later may help, or the feature is switched off
    Unavailable,
    /// The requested data does not exist
    NotFound,
    /// Anything else
    Internal,
}

impl FetchError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Unavailable | FetchError::Timeout { .. } => ErrorKind::Unavailable,
            FetchError::NoData { .. } => ErrorKind::NotFound,
            FetchError::InitFailed { .. }
            | FetchError::LoginFailed { .. }
            | FetchError::Worker(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FetchError::LoginFailed {
            login: 42,
            reason: "(-6, 'Authorization failed')".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "login failed for 42: (-6, 'Authorization failed')"
        );
        assert_eq!(
            FetchError::Unavailable.to_string(),
            "terminal is disabled on this deployment"
        );
        assert_eq!(
            FetchError::Timeout {
                login: 7,
                after: Duration::from_millis(250)
            }
            .to_string(),
            "fetch for 7 timed out after 250ms"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(FetchError::Unavailable.kind(), ErrorKind::Unavailable);
        assert_eq!(
            FetchError::Timeout {
                login: 1,
                after: Duration::from_secs(5)
            }
            .kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            FetchError::NoData {
                login: 1,
                reason: String::new()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            FetchError::InitFailed {
                reason: String::new()
            }
            .kind(),
            ErrorKind::Internal
        );
    }
}
