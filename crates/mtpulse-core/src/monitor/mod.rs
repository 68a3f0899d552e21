mod refresher;

pub use refresher::{CycleReport, RefreshOutcome, Refresher};
