use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::accounts::{Account, Login};
use crate::api::CoreEvent;
use crate::cache::SharedCache;
use crate::snapshot::{FetchError, FetchWorker};

/// Result of refreshing one account
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A fresh snapshot was written to the cache
    Updated { login: Login },
    /// The fetch failed; the previous cache entry is untouched
    Failed { login: Login, error: FetchError },
}

impl RefreshOutcome {
    pub fn login(&self) -> Login {
        match self {
            RefreshOutcome::Updated { login } | RefreshOutcome::Failed { login, .. } => *login,
        }
    }
}

/// Summary of one refresh cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Cycle number, starting at 1
    pub cycle: u64,
    /// One entry per account attempted, in fetch order
    pub outcomes: Vec<RefreshOutcome>,
    /// The terminal is disabled, nothing was fetched
    pub skipped: bool,
    /// Cancellation stopped the cycle before every account was attempted
    pub cancelled: bool,
}

impl CycleReport {
    /// Logins refreshed successfully
    pub fn updated(&self) -> Vec<Login> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RefreshOutcome::Updated { .. }))
            .map(RefreshOutcome::login)
            .collect()
    }

    /// Logins whose fetch failed
    pub fn failed(&self) -> Vec<Login> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RefreshOutcome::Failed { .. }))
            .map(RefreshOutcome::login)
            .collect()
    }
}

/// Background loop keeping the snapshot cache warm
///
/// Each cycle walks the tracked accounts in label order, fetching one at a
/// time on the [`FetchWorker`]. A failing account is logged and skipped;
/// it never stops the cycle. Cycles are serialized by an internal lock, so
/// a manual cycle cannot interleave with the loop's own.
pub struct Refresher {
    accounts: Arc<Vec<Account>>,
    worker: FetchWorker,
    cache: SharedCache,
    interval: Duration,
    event_tx: broadcast::Sender<CoreEvent>,
    /// Number of the last cycle started
    cycle: Mutex<u64>,
}

impl Refresher {
    /// Create a refresher; `accounts` must already be in refresh order
    pub fn new(
        accounts: Arc<Vec<Account>>,
        worker: FetchWorker,
        cache: SharedCache,
        interval: Duration,
        event_tx: broadcast::Sender<CoreEvent>,
    ) -> Self {
        Self {
            accounts,
            worker,
            cache,
            interval,
            event_tx,
            cycle: Mutex::new(0),
        }
    }

    /// Time slept between cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the loop in a background task
    ///
    /// The first cycle runs immediately. Cancelling `cancel` stops the loop
    /// at the next account or sleep boundary.
    pub fn start(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    async fn run(&self, cancel: CancellationToken) {
        info!(
            "Refresh loop started: {} accounts every {:?}",
            self.accounts.len(),
            self.interval
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.run_cycle(&cancel).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Refresh loop stopped");
    }

    /// Run a single cycle over every tracked account
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        let mut cycle = self.cycle.lock().await;
        *cycle += 1;

        let mut report = CycleReport {
            cycle: *cycle,
            ..CycleReport::default()
        };

        if !self.worker.fetcher().session().is_enabled() {
            debug!("Refresh cycle {} skipped: terminal disabled", report.cycle);
            report.skipped = true;
            self.emit_cycle_completed(&report);
            return report;
        }

        for account in self.accounts.iter() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            // Cancellation abandons the in-flight fetch; nothing is cached
            let outcome = tokio::select! {
                _ = cancel.cancelled() => None,
                outcome = self.refresh_account(account) => Some(outcome),
            };
            let Some(outcome) = outcome else {
                report.cancelled = true;
                break;
            };
            match &outcome {
                RefreshOutcome::Updated { login } => {
                    let _ = self
                        .event_tx
                        .send(CoreEvent::SnapshotUpdated { login: *login });
                }
                RefreshOutcome::Failed { login, error } => {
                    warn!("Refresh failed for {} ({}): {}", account.label, login, error);
                    let _ = self.event_tx.send(CoreEvent::RefreshFailed {
                        login: *login,
                        reason: error.to_string(),
                    });
                }
            }
            report.outcomes.push(outcome);
        }

        debug!(
            "Refresh cycle {} done: {} updated, {} failed",
            report.cycle,
            report.updated().len(),
            report.failed().len()
        );
        self.emit_cycle_completed(&report);
        report
    }

    async fn refresh_account(&self, account: &Account) -> RefreshOutcome {
        let login = account.login;
        match self.worker.fetch(account.clone()).await {
            Ok(snapshot) => {
                self.cache.put(snapshot);
                RefreshOutcome::Updated { login }
            }
            Err(error) => RefreshOutcome::Failed { login, error },
        }
    }

    fn emit_cycle_completed(&self, report: &CycleReport) {
        let _ = self.event_tx.send(CoreEvent::CycleCompleted {
            cycle: report.cycle,
            updated: report.updated().len(),
            failed: report.failed().len(),
            skipped: report.skipped,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::sort_accounts;
    use crate::cache::SnapshotCache;
    use crate::snapshot::SnapshotFetcher;
    use crate::terminal::testing::{ScriptHandle, ScriptedTerminal};
    use crate::terminal::TerminalSession;
    use pretty_assertions::assert_eq;

    struct Fixture {
        refresher: Arc<Refresher>,
        cache: SharedCache,
        script: ScriptHandle,
        events: broadcast::Receiver<CoreEvent>,
    }

    fn fixture(accounts: Vec<Account>, interval: Duration) -> Fixture {
        fixture_with(ScriptedTerminal::new(), accounts, interval)
    }

    fn fixture_with(
        terminal: ScriptedTerminal,
        accounts: Vec<Account>,
        interval: Duration,
    ) -> Fixture {
        let script = terminal.handle();
        let session = Arc::new(TerminalSession::new(Box::new(terminal)));
        let worker = FetchWorker::new(SnapshotFetcher::new(session), 2, Duration::from_secs(5));
        let cache = SnapshotCache::shared();
        let (event_tx, events) = broadcast::channel(64);
        let refresher = Arc::new(Refresher::new(
            Arc::new(sort_accounts(accounts)),
            worker,
            cache.clone(),
            interval,
            event_tx,
        ));
        Fixture {
            refresher,
            cache,
            script,
            events,
        }
    }

    fn three_accounts() -> Vec<Account> {
        vec![
            Account::new("C", 3, "s", "t1", "p"),
            Account::new("a", 1, "s", "t1", "p"),
            Account::new("B", 2, "s", "t2", "p"),
        ]
    }

    #[tokio::test]
    async fn test_cycle_fetches_in_label_order() {
        let f = fixture(three_accounts(), Duration::from_secs(10));
        let report = f.refresher.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report.cycle, 1);
        assert_eq!(report.updated(), vec![1, 2, 3]);
        assert_eq!(f.script.info_reads(), vec![1, 2, 3]);
        assert_eq!(f.cache.len(), 3);
    }

    #[tokio::test]
    async fn test_failure_isolated_to_one_account() {
        let f = fixture(three_accounts(), Duration::from_secs(10));
        f.script.fail_login(2);

        let report = f.refresher.run_cycle(&CancellationToken::new()).await;

        assert_eq!(report.updated(), vec![1, 3]);
        assert_eq!(report.failed(), vec![2]);
        assert!(f.cache.get(1).is_some());
        assert!(f.cache.get(2).is_none());
        assert!(f.cache.get(3).is_some());
    }

    #[tokio::test]
    async fn test_stale_entry_kept_on_failure() {
        let f = fixture(three_accounts(), Duration::from_secs(10));
        let cancel = CancellationToken::new();

        f.refresher.run_cycle(&cancel).await;
        let first = f.cache.get(2).unwrap();

        f.script.fail_login(2);
        let report = f.refresher.run_cycle(&cancel).await;

        assert_eq!(report.failed(), vec![2]);
        assert_eq!(f.cache.get(2), Some(first));
    }

    #[tokio::test]
    async fn test_outcome_is_typed() {
        let f = fixture(vec![Account::new("x", 9, "s", "t1", "p")], Duration::from_secs(10));
        f.script.no_data_for(9);

        let report = f.refresher.run_cycle(&CancellationToken::new()).await;
        match &report.outcomes[..] {
            [RefreshOutcome::Failed {
                login: 9,
                error: FetchError::NoData { .. },
            }] => {}
            other => panic!("unexpected outcomes: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disabled_terminal_skips_cycle() {
        let session = Arc::new(TerminalSession::disabled());
        let worker = FetchWorker::new(SnapshotFetcher::new(session), 1, Duration::from_secs(1));
        let cache = SnapshotCache::shared();
        let (event_tx, mut events) = broadcast::channel(8);
        let refresher = Refresher::new(
            Arc::new(three_accounts()),
            worker,
            cache.clone(),
            Duration::from_secs(10),
            event_tx,
        );

        let report = refresher.run_cycle(&CancellationToken::new()).await;
        assert!(report.skipped);
        assert!(report.outcomes.is_empty());
        assert!(cache.is_empty());
        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::CycleCompleted { skipped: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_cycle_attempts_nothing() {
        let f = fixture(three_accounts(), Duration::from_secs(10));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = f.refresher.run_cycle(&cancel).await;
        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert!(f.script.info_reads().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_abandons_in_flight_fetch() {
        let terminal = ScriptedTerminal::new().with_delay(Duration::from_millis(800));
        let f = fixture_with(terminal, three_accounts(), Duration::from_secs(10));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let report = f.refresher.run_cycle(&cancel).await;

        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert!(started.elapsed() < Duration::from_millis(600));
        assert!(f.cache.is_empty());
    }

    #[tokio::test]
    async fn test_events_emitted_per_account() {
        let mut f = fixture(three_accounts(), Duration::from_secs(10));
        f.script.fail_login(3);
        f.refresher.run_cycle(&CancellationToken::new()).await;

        let mut seen = Vec::new();
        while let Ok(event) = f.events.try_recv() {
            seen.push(event);
        }
        assert!(matches!(seen[0], CoreEvent::SnapshotUpdated { login: 1 }));
        assert!(matches!(seen[1], CoreEvent::SnapshotUpdated { login: 2 }));
        assert!(matches!(seen[2], CoreEvent::RefreshFailed { login: 3, .. }));
        assert!(matches!(
            seen[3],
            CoreEvent::CycleCompleted {
                cycle: 1,
                updated: 2,
                failed: 1,
                skipped: false
            }
        ));
    }

    #[tokio::test]
    async fn test_loop_runs_until_cancelled() {
        let mut f = fixture(three_accounts(), Duration::from_millis(20));
        let cancel = CancellationToken::new();
        let handle = f.refresher.clone().start(cancel.clone());

        let mut completed = 0;
        while completed < 3 {
            if let CoreEvent::CycleCompleted { .. } = f.events.recv().await.unwrap() {
                completed += 1;
            }
        }

        cancel.cancel();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop did not stop")
            .unwrap();

        assert!(f.script.info_reads().len() >= 9);
    }

    #[tokio::test]
    async fn test_single_account_session_reused_across_cycles() {
        let f = fixture(vec![Account::new("solo", 5, "s", "t1", "p")], Duration::from_secs(10));
        let cancel = CancellationToken::new();
        for _ in 0..4 {
            f.refresher.run_cycle(&cancel).await;
        }

        assert_eq!(f.script.initializes(), vec!["t1".to_string()]);
        assert_eq!(f.script.logins(), vec![5]);
        assert_eq!(f.script.info_reads().len(), 4);
    }
}
