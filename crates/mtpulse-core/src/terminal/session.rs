use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use super::capability::TerminalCapability;
use crate::accounts::Login;
use crate::snapshot::{AccountInfo, FetchError};

/// Which terminal and login the session is currently attached to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Path of the terminal last initialized
    pub current_terminal: Option<String>,
    /// Account last authenticated on that terminal
    pub current_login: Option<Login>,
}

struct SessionInner {
    capability: Option<Box<dyn TerminalCapability>>,
    state: SessionState,
}

/// The single, lock-guarded session to a remote terminal
///
/// All terminal access goes through [`TerminalSession::lock`], which hands
/// out a [`SessionGuard`]. Holding the guard for a whole fetch keeps
/// concurrent callers from interleaving terminal or login switches.
///
/// Whether the session is usable is tracked outside the lock, so
/// [`is_enabled`](Self::is_enabled) never waits on an in-flight fetch.
pub struct TerminalSession {
    inner: Mutex<SessionInner>,
    enabled: bool,
    closed: AtomicBool,
}

impl TerminalSession {
    /// Create an enabled session over a capability
    pub fn new(capability: Box<dyn TerminalCapability>) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                capability: Some(capability),
                state: SessionState::default(),
            }),
            enabled: true,
            closed: AtomicBool::new(false),
        }
    }

    /// Create a session for deployments without a terminal
    pub fn disabled() -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                capability: None,
                state: SessionState::default(),
            }),
            enabled: false,
            closed: AtomicBool::new(false),
        }
    }

    /// Whether fetches can succeed at all
    ///
    /// Never blocks.
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.closed.load(Ordering::Acquire)
    }

    /// Enter the exclusive section
    ///
    /// Blocks until no other caller holds the session.
    pub fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            inner: self.inner.lock(),
            closed: &self.closed,
        }
    }

    /// Copy of the current session state
    pub fn state(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    /// Tear the session down
    ///
    /// Safe to call more than once; teardown errors are logged and dropped.
    /// Afterwards every operation fails with [`FetchError::Unavailable`].
    /// The session reports disabled as soon as this is called, even while
    /// it still waits for an in-flight fetch to release the lock.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut inner = self.inner.lock();
        inner.state = SessionState::default();
        if let Some(capability) = inner.capability.as_mut() {
            if let Err(e) = capability.shutdown() {
                debug!("Terminal shutdown failed during close: {}", e);
            }
        }
    }
}

/// Exclusive access to the terminal session
pub struct SessionGuard<'a> {
    inner: MutexGuard<'a, SessionInner>,
    closed: &'a AtomicBool,
}

impl SessionGuard<'_> {
    /// Make sure the terminal at `path` is the one attached
    ///
    /// Switching terminals tears the old one down and forces a new login.
    /// On failure the state is left empty so the next call starts over.
    pub fn ensure_terminal(&mut self, path: &str) -> Result<(), FetchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FetchError::Unavailable);
        }
        let inner = &mut *self.inner;
        let capability = inner.capability.as_mut().ok_or(FetchError::Unavailable)?;

        if inner.state.current_terminal.as_deref() == Some(path) {
            return Ok(());
        }

        debug!("Switching terminal to {}", path);
        if let Err(e) = capability.shutdown() {
            debug!("Ignoring terminal shutdown error: {}", e);
        }
        inner.state = SessionState::default();

        if !capability.initialize(path) {
            return Err(FetchError::InitFailed {
                reason: capability.last_error(),
            });
        }

        inner.state.current_terminal = Some(path.to_string());
        inner.state.current_login = None;
        Ok(())
    }

    /// Make sure `login` is the authenticated account
    ///
    /// A no-op when the account is already logged in.
    pub fn ensure_login(
        &mut self,
        login: Login,
        password: &str,
        server: &str,
    ) -> Result<(), FetchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FetchError::Unavailable);
        }
        let inner = &mut *self.inner;
        let capability = inner.capability.as_mut().ok_or(FetchError::Unavailable)?;

        if inner.state.current_login == Some(login) {
            return Ok(());
        }

        debug!("Logging in account {} on {}", login, server);
        inner.state.current_login = None;
        if !capability.login(login, password, server) {
            return Err(FetchError::LoginFailed {
                login,
                reason: capability.last_error(),
            });
        }

        inner.state.current_login = Some(login);
        Ok(())
    }

    /// Read the logged-in account's metrics
    pub fn account_info(&mut self) -> Result<Option<AccountInfo>, FetchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FetchError::Unavailable);
        }
        let inner = &mut *self.inner;
        let capability = inner.capability.as_mut().ok_or(FetchError::Unavailable)?;
        Ok(capability.account_info())
    }

    /// Last error text reported by the terminal
    pub fn last_error(&self) -> String {
        self.inner
            .capability
            .as_ref()
            .map(|c| c.last_error())
            .unwrap_or_default()
    }

    /// Current session state
    pub fn state(&self) -> &SessionState {
        &self.inner.state
    }
}
