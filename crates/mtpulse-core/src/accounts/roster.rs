//! Static account roster loading

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::types::Account;

/// Load the tracked accounts from a JSON array file.
///
/// A missing file yields an empty roster. Duplicate logins are rejected.
/// The result is ordered by [`sort_accounts`].
pub fn load_accounts(path: &Path) -> Result<Vec<Account>> {
    if !path.exists() {
        tracing::info!("No accounts file at {:?}; tracking no accounts", path);
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read accounts file: {:?}", path))?;
    let accounts: Vec<Account> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse accounts file: {:?}", path))?;

    let mut seen = HashSet::new();
    for account in &accounts {
        if !seen.insert(account.login) {
            bail!("Duplicate login {} in {:?}", account.login, path);
        }
    }

    Ok(sort_accounts(accounts))
}

/// Order accounts by display label, case-insensitive (stable for equal labels)
pub fn sort_accounts(mut accounts: Vec<Account>) -> Vec<Account> {
    accounts.sort_by_cached_key(Account::sort_key);
    accounts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_roster(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let accounts = load_accounts(&dir.path().join("accounts.json")).unwrap();
        assert!(accounts.is_empty());
    }

    #[test]
    fn test_load_sorted_by_label() {
        let file = write_roster(
            r#"[
                {"label": "beta", "login": 2, "password": "p", "server": "s", "terminal_path": "t"},
                {"label": "Alpha", "login": 1, "password": "p", "server": "s", "terminal_path": "t"},
                {"label": "Gamma", "login": 3, "password": "p", "server": "s", "terminal_path": "t"}
            ]"#,
        );
        let accounts = load_accounts(file.path()).unwrap();
        let logins: Vec<i64> = accounts.iter().map(|a| a.login).collect();
        assert_eq!(logins, vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicate_login_rejected() {
        let file = write_roster(
            r#"[
                {"label": "a", "login": 7, "password": "p", "server": "s", "terminal_path": "t"},
                {"label": "b", "login": 7, "password": "p", "server": "s", "terminal_path": "t"}
            ]"#,
        );
        let err = load_accounts(file.path()).unwrap_err();
        assert!(err.to_string().contains("Duplicate login 7"));
    }

    #[test]
    fn test_malformed_file_errors() {
        let file = write_roster("{not json");
        assert!(load_accounts(file.path()).is_err());
    }

    #[test]
    fn test_sort_is_case_insensitive() {
        let accounts = vec![
            Account::new("zeta", 1, "s", "t", "p"),
            Account::new("Eta", 2, "s", "t", "p"),
            Account::new("alpha", 3, "s", "t", "p"),
        ];
        let labels: Vec<String> = sort_accounts(accounts)
            .into_iter()
            .map(|a| a.label)
            .collect();
        assert_eq!(labels, vec!["alpha", "Eta", "zeta"]);
    }
}
