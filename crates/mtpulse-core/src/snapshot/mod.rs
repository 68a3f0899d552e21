//! Point-in-time account snapshots and the blocking fetch path.

mod error;
mod fetcher;
mod types;
mod worker;

pub use error::{ErrorKind, FetchError};
pub use fetcher::SnapshotFetcher;
pub use types::{epoch_seconds, AccountInfo, AccountSnapshot};
pub use worker::FetchWorker;
