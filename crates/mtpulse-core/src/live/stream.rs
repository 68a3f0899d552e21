use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

use crate::accounts::Login;
use crate::cache::SharedCache;
use crate::snapshot::{epoch_seconds, AccountSnapshot};

/// Ticks buffered per subscriber before the producer waits
const SUBSCRIPTION_BUFFER: usize = 4;

/// Event type tag on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveEventType {
    PositionsSnapshot,
}

/// The four headline metrics carried by a live event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveMetrics {
    pub balance: f64,
    pub equity: f64,
    pub margin: f64,
    pub margin_free: f64,
}

/// One account's metrics as pushed to a live subscriber
///
/// Field names are a wire contract shared with existing dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveEvent {
    #[serde(rename = "type")]
    pub kind: LiveEventType,
    /// Login as a string
    pub account: String,
    /// Reserved for open positions; always empty for now
    pub positions: Vec<serde_json::Value>,
    pub snapshot: LiveMetrics,
    /// Emission time, Unix epoch seconds
    pub ts: f64,
}

impl LiveEvent {
    /// Build an event for `snapshot` emitted at `at`
    pub fn from_snapshot(snapshot: &AccountSnapshot, at: &DateTime<Utc>) -> Self {
        Self {
            kind: LiveEventType::PositionsSnapshot,
            account: snapshot.login.to_string(),
            positions: Vec::new(),
            snapshot: LiveMetrics {
                balance: snapshot.balance,
                equity: snapshot.equity,
                margin: snapshot.margin,
                margin_free: snapshot.margin_free,
            },
            ts: epoch_seconds::to_f64(at),
        }
    }
}

/// Everything emitted on one tick
#[derive(Debug, Clone, PartialEq)]
pub struct LiveTick {
    pub at: DateTime<Utc>,
    /// One event per tracked account with a cached snapshot
    pub events: Vec<LiveEvent>,
}

/// Read-only view of the cache that produces live ticks
#[derive(Clone)]
pub struct LiveStream {
    cache: SharedCache,
    logins: Arc<Vec<Login>>,
    interval: Duration,
}

impl LiveStream {
    /// `logins` fixes both the tracked set and the event order
    pub fn new(cache: SharedCache, logins: Arc<Vec<Login>>, interval: Duration) -> Self {
        Self {
            cache,
            logins,
            interval,
        }
    }

    /// Build the events for one tick from the current cache contents
    ///
    /// Accounts without a cached snapshot are skipped.
    pub fn tick(&self) -> LiveTick {
        let at = Utc::now();
        let events = self
            .cache
            .get_many(self.logins.iter().copied())
            .iter()
            .map(|snapshot| LiveEvent::from_snapshot(snapshot, &at))
            .collect();
        LiveTick { at, events }
    }

    /// Start a producer task for one subscriber
    ///
    /// The producer ends when `cancel` fires or when the returned
    /// subscription is dropped.
    pub fn spawn(self, cancel: CancellationToken) -> LiveSubscription {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let token = cancel.child_token();
        let guard = token.clone().drop_guard();

        tokio::spawn(async move {
            self.run(tx, token).await;
        });

        LiveSubscription { rx, _guard: guard }
    }

    async fn run(self, tx: mpsc::Sender<LiveTick>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tx.closed() => break,
                _ = ticker.tick() => {}
            }

            let tick = self.tick();
            tokio::select! {
                _ = cancel.cancelled() => break,
                sent = tx.send(tick) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }

        debug!("Live subscription closed");
    }
}

/// Receiving end of one live subscription
///
/// Dropping it stops the producer.
pub struct LiveSubscription {
    rx: mpsc::Receiver<LiveTick>,
    _guard: DropGuard,
}

impl LiveSubscription {
    /// Wait for the next tick; `None` once the producer has stopped
    pub async fn next_tick(&mut self) -> Option<LiveTick> {
        self.rx.recv().await
    }
}

impl Stream for LiveSubscription {
    type Item = LiveTick;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
