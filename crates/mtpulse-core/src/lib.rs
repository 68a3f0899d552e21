//! Core library for mtpulse.
//!
//! Keeps one reusable session to a trading terminal, refreshes a snapshot
//! of every tracked account into an in-memory cache, and streams the cache
//! to live subscribers. Consumers should go through [`api::PulseCore`].

pub mod accounts;
pub mod api;
pub mod cache;
pub mod config;
pub mod live;
pub mod monitor;
pub mod snapshot;
pub mod terminal;

pub use api::{PulseCore, PulseCoreBuilder};
