//! HTTP transport for dashboards
//!
//! Provides a REST API over the snapshot cache and SSE for live metrics.

mod api;
mod events;
mod server;

pub use server::WebServer;
