use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// Terminal account number
pub type Login = i64;

/// A tracked trading account
///
/// Read-only to the core. The password is kept as a [`SecretString`] so it
/// is redacted from `Debug` output and never serialized.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// Display label shown on the dashboard
    pub label: String,
    /// Account number, unique within the tracked set
    pub login: Login,
    /// Trade server name
    pub server: String,
    /// Configured currency (empty means "use what the terminal reports")
    #[serde(default)]
    pub currency: String,
    /// Location of the terminal instance this account lives in
    pub terminal_path: String,
    /// Login password
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,
    /// Starting account size, used by the dashboard for net return
    #[serde(default)]
    pub account_size: Option<f64>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Account {
    /// Create an account with no configured currency and no account size
    pub fn new(
        label: impl Into<String>,
        login: Login,
        server: impl Into<String>,
        terminal_path: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            login,
            server: server.into(),
            currency: String::new(),
            terminal_path: terminal_path.into(),
            password: SecretString::from(password.into()),
            account_size: None,
        }
    }

    /// Set the configured currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Key used to order accounts (label, case-insensitive)
    pub fn sort_key(&self) -> String {
        self.label.to_lowercase()
    }

    /// Login rendered the way the dashboard addresses accounts
    pub fn login_hint(&self) -> String {
        self.login.to_string()
    }

    /// Borrow the plaintext password. Only the terminal session should call this.
    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let account = Account::new("Main", 1001, "Demo-Server", "C:/mt5/a", "hunter2");
        let rendered = format!("{:?}", account);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("1001"));
    }

    #[test]
    fn test_deserialize_account() {
        let json = r#"{
            "label": "Funded 100k",
            "login": 52011,
            "password": "s3cret",
            "server": "Broker-Live",
            "currency": "USD",
            "terminal_path": "C:/MT5/terminal64.exe",
            "account_size": 100000
        }"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.login, 52011);
        assert_eq!(account.currency, "USD");
        assert_eq!(account.account_size, Some(100000.0));
        assert_eq!(account.password(), "s3cret");
    }

    #[test]
    fn test_missing_currency_defaults_empty() {
        let json = r#"{
            "label": "x", "login": 1, "password": "p",
            "server": "s", "terminal_path": "t"
        }"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert!(account.currency.is_empty());
        assert!(account.account_size.is_none());
    }
}
