//! Server-Sent Events for live account metrics

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures_util::{stream, StreamExt};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use mtpulse_core::live::{LiveEvent, LiveTick};
use mtpulse_core::PulseCore;

/// State for SSE handler
pub struct SseState {
    pub core: Arc<PulseCore>,
    /// Number of connected live subscribers
    pub subscribers: Arc<AtomicUsize>,
}

impl SseState {
    pub fn new(core: Arc<PulseCore>) -> Self {
        Self {
            core,
            subscribers: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Lives as long as one subscriber's response stream
struct SubscriberGuard {
    id: Uuid,
    subscribers: Arc<AtomicUsize>,
}

impl SubscriberGuard {
    fn connect(subscribers: Arc<AtomicUsize>) -> Self {
        let id = Uuid::new_v4();
        let active = subscribers.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Live subscriber {} connected ({} active)", id, active);
        Self { id, subscribers }
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        let active = self.subscribers.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!("Live subscriber {} disconnected ({} active)", self.id, active);
    }
}

/// Encode one live event as an unnamed SSE message
fn to_sse_event(event: &LiveEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().data(json)),
        Err(e) => {
            tracing::warn!("Dropping live event for {}: {}", event.account, e);
            None
        }
    }
}

fn tick_events(tick: LiveTick) -> Vec<Result<Event, Infallible>> {
    tick.events.iter().filter_map(to_sse_event).map(Ok).collect()
}

/// SSE stream of live snapshots
///
/// Every tick yields one `message` event per account with a cached
/// snapshot. The subscription is dropped with the response stream when the
/// client disconnects, which stops its producer.
pub async fn events(State(state): State<Arc<SseState>>) -> impl IntoResponse {
    let guard = SubscriberGuard::connect(state.subscribers.clone());

    let stream = state.core.subscribe_live().flat_map(move |tick| {
        let _guard = &guard;
        stream::iter(tick_events(tick))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
