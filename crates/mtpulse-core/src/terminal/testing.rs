//! Scripted terminal capability for tests.
//!
//! Reports deterministic metrics derived from the logged-in account number
//! (`balance = login * 1000`) so tests can tell which account a snapshot
//! really came from. Failures can be scripted per terminal path or per login
//! and switched at runtime through a [`ScriptHandle`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::capability::TerminalCapability;
use crate::accounts::Login;
use crate::snapshot::AccountInfo;

#[derive(Default)]
struct Script {
    failing_paths: HashSet<String>,
    failing_logins: HashSet<Login>,
    no_data_logins: HashSet<Login>,
    fail_shutdown: bool,
    delay: Option<Duration>,
    initializes: Vec<String>,
    logins: Vec<Login>,
    info_reads: Vec<Login>,
    shutdowns: usize,
}

/// Shared view of a [`ScriptedTerminal`]'s script and call log
#[derive(Clone, Default)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl ScriptHandle {
    /// Terminal paths passed to `initialize`, in call order
    pub fn initializes(&self) -> Vec<String> {
        self.script.lock().initializes.clone()
    }

    /// Logins passed to `login`, in call order
    pub fn logins(&self) -> Vec<Login> {
        self.script.lock().logins.clone()
    }

    /// Logins whose account info was read, in call order
    pub fn info_reads(&self) -> Vec<Login> {
        self.script.lock().info_reads.clone()
    }

    /// Number of `shutdown` calls
    pub fn shutdowns(&self) -> usize {
        self.script.lock().shutdowns
    }

    /// Highest number of terminal calls ever observed in flight at once
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Make future logins for `login` fail
    pub fn fail_login(&self, login: Login) {
        self.script.lock().failing_logins.insert(login);
    }

    /// Let `login` authenticate again
    pub fn recover_login(&self, login: Login) {
        self.script.lock().failing_logins.remove(&login);
    }

    /// Make account info for `login` come back empty
    pub fn no_data_for(&self, login: Login) {
        self.script.lock().no_data_logins.insert(login);
    }

    fn enter(&self) -> CallGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        CallGuard { active: &self.active }
    }
}

struct CallGuard<'a> {
    active: &'a AtomicUsize,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory terminal driven by a script
#[derive(Default)]
pub struct ScriptedTerminal {
    handle: ScriptHandle,
    logged_in: Option<Login>,
    last_error: String,
}

impl ScriptedTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for inspecting calls and changing the script later
    pub fn handle(&self) -> ScriptHandle {
        self.handle.clone()
    }

    /// Fail every `initialize` for this path
    pub fn fail_initialize(self, path: &str) -> Self {
        self.handle
            .script
            .lock()
            .failing_paths
            .insert(path.to_string());
        self
    }

    /// Fail every login for this account
    pub fn fail_login(self, login: Login) -> Self {
        self.handle.fail_login(login);
        self
    }

    /// Make `shutdown` return an error
    pub fn fail_shutdown(self) -> Self {
        self.handle.script.lock().fail_shutdown = true;
        self
    }

    /// Sleep this long inside every account info read
    pub fn with_delay(self, delay: Duration) -> Self {
        self.handle.script.lock().delay = Some(delay);
        self
    }
}

impl TerminalCapability for ScriptedTerminal {
    fn initialize(&mut self, path: &str) -> bool {
        let _call = self.handle.enter();
        let mut script = self.handle.script.lock();
        script.initializes.push(path.to_string());
        self.logged_in = None;
        if script.failing_paths.contains(path) {
            self.last_error = format!("(-10003, 'IPC initialize failed for {}')", path);
            return false;
        }
        true
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        let mut script = self.handle.script.lock();
        script.shutdowns += 1;
        self.logged_in = None;
        if script.fail_shutdown {
            anyhow::bail!("terminal already gone");
        }
        Ok(())
    }

    fn login(&mut self, login: Login, _password: &str, _server: &str) -> bool {
        let _call = self.handle.enter();
        let mut script = self.handle.script.lock();
        script.logins.push(login);
        if script.failing_logins.contains(&login) {
            self.logged_in = None;
            self.last_error = "(-6, 'Terminal: Authorization failed')".to_string();
            return false;
        }
        self.logged_in = Some(login);
        true
    }

    fn last_error(&self) -> String {
        self.last_error.clone()
    }

    fn account_info(&mut self) -> Option<AccountInfo> {
        let _call = self.handle.enter();
        let login = self.logged_in?;
        let delay = {
            let mut script = self.handle.script.lock();
            script.info_reads.push(login);
            if script.no_data_logins.contains(&login) {
                self.last_error = "(-1, 'Terminal: Call failed')".to_string();
                return None;
            }
            script.delay
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let balance = login as f64 * 1000.0;
        Some(AccountInfo {
            balance,
            equity: balance + 50.0,
            margin: 10.0,
            margin_free: balance + 40.0,
            margin_level: (balance + 50.0) / 10.0 * 100.0,
            profit: 50.0,
            currency: "USD".to_string(),
        })
    }
}
