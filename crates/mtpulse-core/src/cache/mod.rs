mod store;

pub use store::{SharedCache, SnapshotCache};
