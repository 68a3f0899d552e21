use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::accounts::Login;
use crate::snapshot::AccountSnapshot;

/// Shared cache type alias
pub type SharedCache = Arc<SnapshotCache>;

/// Latest snapshot per account
///
/// Entries are never evicted. Only the refresh loop writes, so a plain
/// overwrite always keeps the newest snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: RwLock<HashMap<Login, AccountSnapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new shared cache
    pub fn shared() -> SharedCache {
        Arc::new(Self::new())
    }

    /// Latest snapshot for `login`, if one was ever fetched
    pub fn get(&self, login: Login) -> Option<AccountSnapshot> {
        self.entries.read().get(&login).cloned()
    }

    /// Store `snapshot` as the latest for its login
    pub fn put(&self, snapshot: AccountSnapshot) {
        self.entries.write().insert(snapshot.login, snapshot);
    }

    /// Snapshots for each of `logins` that has one, in the given order
    pub fn get_many(&self, logins: impl IntoIterator<Item = Login>) -> Vec<AccountSnapshot> {
        let entries = self.entries.read();
        logins
            .into_iter()
            .filter_map(|login| entries.get(&login).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn snapshot(login: Login, equity: f64) -> AccountSnapshot {
        AccountSnapshot {
            label: format!("acct-{login}"),
            login,
            balance: 1000.0,
            equity,
            margin: 0.0,
            margin_free: equity,
            margin_level: 0.0,
            profit: equity - 1000.0,
            currency: "USD".to_string(),
            server: "s".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_empty_cache() {
        let cache = SnapshotCache::new();
        assert!(cache.is_empty());
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let cache = SnapshotCache::new();
        let first = snapshot(1, 1000.0);
        let mut second = snapshot(1, 1100.0);
        second.timestamp = first.timestamp + Duration::seconds(10);

        cache.put(first);
        cache.put(second.clone());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1), Some(second));
    }

    #[test]
    fn test_get_many_keeps_order_and_skips_absent() {
        let cache = SnapshotCache::new();
        cache.put(snapshot(3, 1.0));
        cache.put(snapshot(1, 1.0));

        let logins: Vec<Login> = cache.get_many([1, 2, 3]).iter().map(|s| s.login).collect();
        assert_eq!(logins, vec![1, 3]);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let cache = SnapshotCache::shared();
        let writer = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    cache.put(snapshot(i % 5, i as f64));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        if let Some(s) = cache.get(2) {
                            assert_eq!(s.login, 2);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cache.len(), 5);
    }
}
