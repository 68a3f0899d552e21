//! Per-subscriber live feed of cached snapshots.

mod stream;

pub use stream::{LiveEvent, LiveEventType, LiveMetrics, LiveStream, LiveSubscription, LiveTick};
