//! Synthetic terminal for running without a real trading terminal.
//!
//! Balances drift in a small random walk on every read. The default roster
//! spreads three accounts across two terminals and gives one of them a
//! password the demo terminal rejects, so the dashboard shows a healthy
//! account, a terminal switch and a failing login side by side.

use std::collections::HashMap;

use rand::RngExt;

use super::capability::TerminalCapability;
use crate::accounts::{Account, Login};
use crate::snapshot::AccountInfo;

/// Password the demo terminal accepts for every account
pub const DEMO_PASSWORD: &str = "demo";

/// Terminal paths the demo terminal can attach to
pub const DEMO_TERMINALS: &[&str] = &["demo://terminal-a", "demo://terminal-b"];

struct DemoBook {
    balance: f64,
    open_profit: f64,
    margin: f64,
}

/// In-process terminal producing drifting account metrics
pub struct DemoTerminal {
    books: HashMap<Login, DemoBook>,
    attached: Option<String>,
    logged_in: Option<Login>,
    last_error: String,
}

impl DemoTerminal {
    /// Create a demo terminal serving the given accounts
    pub fn new(accounts: &[Account]) -> Self {
        let books = accounts
            .iter()
            .map(|a| {
                let balance = a.account_size.unwrap_or(10_000.0);
                (
                    a.login,
                    DemoBook {
                        balance,
                        open_profit: 0.0,
                        margin: balance * 0.02,
                    },
                )
            })
            .collect();
        Self {
            books,
            attached: None,
            logged_in: None,
            last_error: String::new(),
        }
    }
}

/// Build the default demo roster
pub fn demo_accounts() -> Vec<Account> {
    let mut funded = Account::new(
        "Funded 100k",
        7_100_001,
        "Demo-Live",
        DEMO_TERMINALS[0],
        DEMO_PASSWORD,
    )
    .with_currency("USD");
    funded.account_size = Some(100_000.0);

    let mut swing = Account::new(
        "swing eur",
        7_100_002,
        "Demo-Live",
        DEMO_TERMINALS[1],
        DEMO_PASSWORD,
    );
    swing.account_size = Some(25_000.0);

    let locked = Account::new(
        "Locked out",
        7_100_003,
        "Demo-Live",
        DEMO_TERMINALS[1],
        "wrong-password",
    );

    vec![funded, swing, locked]
}

impl TerminalCapability for DemoTerminal {
    fn initialize(&mut self, path: &str) -> bool {
        self.logged_in = None;
        if DEMO_TERMINALS.contains(&path) {
            self.attached = Some(path.to_string());
            true
        } else {
            self.attached = None;
            self.last_error = format!("(-10003, 'IPC initialize failed, terminal not found: {}')", path);
            false
        }
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        self.attached = None;
        self.logged_in = None;
        Ok(())
    }

    fn login(&mut self, login: Login, password: &str, _server: &str) -> bool {
        if self.attached.is_none() {
            self.last_error = "(-10004, 'No IPC connection')".to_string();
            return false;
        }
        if password != DEMO_PASSWORD || !self.books.contains_key(&login) {
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
        let login = self.logged_in?;
        let book = self.books.get_mut(&login)?;

        let mut rng = rand::rng();
        book.open_profit += rng.random_range(-0.002..0.002) * book.balance;
        book.margin = (book.margin * (1.0 + rng.random_range(-0.05..0.05))).max(0.0);

        let equity = book.balance + book.open_profit;
        let margin_level = if book.margin > 0.0 {
            equity / book.margin * 100.0
        } else {
            0.0
        };
        Some(AccountInfo {
            balance: book.balance,
            equity,
            margin: book.margin,
            margin_free: equity - book.margin,
            margin_level,
            profit: book.open_profit,
            currency: "EUR".to_string(),
        })
    }
}
