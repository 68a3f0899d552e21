use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::error::FetchError;
use super::fetcher::SnapshotFetcher;
use super::types::AccountSnapshot;
use crate::accounts::Account;

/// Runs blocking fetches off the async executor
///
/// Each fetch goes to `spawn_blocking`, at most `workers` at a time. The
/// permit stays with the blocking task until the terminal call returns, so
/// a hung terminal cannot pile up threads even after the caller has given
/// up on it.
#[derive(Clone)]
pub struct FetchWorker {
    fetcher: SnapshotFetcher,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl FetchWorker {
    pub fn new(fetcher: SnapshotFetcher, workers: usize, timeout: Duration) -> Self {
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            timeout,
        }
    }

    /// The underlying blocking fetcher
    pub fn fetcher(&self) -> &SnapshotFetcher {
        &self.fetcher
    }

    /// Fetch a snapshot on a blocking thread and wait for it
    ///
    /// One deadline covers waiting for a worker slot, the blocking call and
    /// the join. Once it elapses the caller gets [`FetchError::Timeout`];
    /// a terminal call already running keeps going to completion.
    pub async fn fetch(&self, account: Account) -> Result<AccountSnapshot, FetchError> {
        let login = account.login;
        let permits = self.permits.clone();
        let fetcher = self.fetcher.clone();

        let attempt = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|e| FetchError::Worker(e.to_string()))?;

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                fetcher.fetch_snapshot(&account)
            })
            .await
            .map_err(|e| FetchError::Worker(e.to_string()))?
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Fetch for {} exceeded {:?}; leaving it to finish in the background",
                    login,
                    self.timeout
                );
                Err(FetchError::Timeout {
                    login,
                    after: self.timeout,
                })
            }
        }
    }
}
