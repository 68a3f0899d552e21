//! Web server implementation using axum

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use mtpulse_core::config::WebSettings;
use mtpulse_core::PulseCore;

use super::api::{self, ApiState};
use super::events::{self, SseState};

/// Web server exposing the cached metrics and the live feed
pub struct WebServer {
    settings: WebSettings,
    core: Arc<PulseCore>,
}

impl WebServer {
    /// Create a new web server
    pub fn new(settings: WebSettings, core: Arc<PulseCore>) -> Self {
        Self { settings, core }
    }

    /// Start the web server in a background task
    pub fn start(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Build the router with every route and the CORS layer
    pub fn router(&self) -> Router {
        let api_state = Arc::new(ApiState {
            core: self.core.clone(),
        });
        let sse_state = Arc::new(SseState::new(self.core.clone()));

        let api_routes = Router::new()
            .route("/health", get(api::health))
            .route("/accounts", get(api::get_accounts))
            .route("/accounts/{login}", get(api::get_account))
            .route("/accounts/{login}/snapshot", get(api::get_snapshot))
            .with_state(api_state);

        let events_routes = Router::new()
            .route("/events", get(events::events))
            .with_state(sse_state);

        Router::new()
            .merge(api_routes)
            .merge(events_routes)
            .layer(cors_layer(&self.settings.cors_origins))
    }

    /// Run the web server until `shutdown` is cancelled
    async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let addr = format!("{}:{}", self.settings.host, self.settings.port);
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!("Web server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await?;

        tracing::info!("Web server stopped");
        Ok(())
    }
}

/// CORS for browser dashboards: listed origins, GET only
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .allow_headers(Any)
}
