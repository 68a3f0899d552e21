//! Remote trading-terminal session management.
//!
//! A [`TerminalSession`] owns the single process-wide connection to a
//! terminal through a [`TerminalCapability`] and avoids re-initializing or
//! re-authenticating when consecutive fetches target the same terminal and
//! login.

mod capability;
pub mod demo;
mod session;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use capability::TerminalCapability;
pub use demo::{demo_accounts, DemoTerminal};
pub use session::{SessionGuard, SessionState, TerminalSession};
