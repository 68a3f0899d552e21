//! Public API layer (Facade) for mtpulse-core.
//!
//! [`PulseCore`] owns the terminal session, the snapshot cache, the refresh
//! loop and the live feed, and exposes typed query and action methods.
//! Transports (the web server, tests, embedding apps) use this instead of
//! wiring the pieces themselves.
//!
//! # Quick Start
//!
//! ```ignore
//! use mtpulse_core::api::PulseCoreBuilder;
//!
//! let core = PulseCoreBuilder::new(settings)
//!     .with_accounts(accounts)
//!     .with_terminal(Box::new(terminal))
//!     .build();
//!
//! core.start_refresh()?;
//! let overview = core.list_accounts();
//! let mut live = core.subscribe_live();
//! ```

mod actions;
mod builder;
mod core;
pub mod events;
mod queries;
pub mod types;

pub use builder::PulseCoreBuilder;
pub use core::PulseCore;
pub use events::CoreEvent;
pub use types::{AccountOverview, ApiError};
