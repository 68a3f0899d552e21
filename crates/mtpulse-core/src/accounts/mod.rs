mod roster;
mod types;

pub use roster::{load_accounts, sort_accounts};
pub use types::{Account, Login};
