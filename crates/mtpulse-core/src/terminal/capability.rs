use crate::accounts::Login;
use crate::snapshot::AccountInfo;

/// Narrow interface to a remote trading terminal
///
/// Calls are blocking and may be slow. Implementations are only ever driven
/// from inside a [`TerminalSession`](super::TerminalSession) lock, so they
/// need not be `Sync`.
pub trait TerminalCapability: Send {
    /// Attach to the terminal instance at `path`
    fn initialize(&mut self, path: &str) -> bool;

    /// Detach from the current terminal instance
    fn shutdown(&mut self) -> anyhow::Result<()>;

    /// Authenticate an account on the attached terminal
    fn login(&mut self, login: Login, password: &str, server: &str) -> bool;

    /// Human-readable description of the last failure
    fn last_error(&self) -> String;

    /// Read the logged-in account's metrics
    fn account_info(&mut self) -> Option<AccountInfo>;
}
