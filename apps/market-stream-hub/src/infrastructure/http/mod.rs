//! REST and Client WebSocket Server
//!
//! # Routes
//!
//! - `GET /api/stocks/search?q=` - Local and remote symbol search
//! - `GET /api/stocks/{symbol}` - Quote snapshot
//! - `GET /api/stocks/{symbol}/history?range=&interval=` - Candles
//! - `GET /api/market/status` - Exchange session status
//! - `GET /ws` - Live tick stream (WebSocket upgrade)
//!
//! Errors are JSON `{"error": "..."}`: 400 for bad input, 500 with a
//! generic per-route message for upstream failures.

mod error;
mod routes;
mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::{
    HistoryService, MarketStatusService, QuoteService, SearchService, SubscriptionHub,
};

pub use error::ApiError;
pub use ws::{ClientFrame, ServerFrame};

/// Services behind the REST and WebSocket routes.
pub struct ApiState {
    /// Quote lookups.
    pub quotes: Arc<QuoteService>,
    /// Candle history.
    pub history: Arc<HistoryService>,
    /// Symbol search.
    pub search: Arc<SearchService>,
    /// Exchange session status.
    pub market: Arc<MarketStatusService>,
    /// Live tick fan-out.
    pub hub: Arc<SubscriptionHub>,
}

/// Build the application router.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/api/stocks/search", get(routes::search_stocks))
        .route("/api/stocks/{symbol}", get(routes::get_stock))
        .route("/api/stocks/{symbol}/history", get(routes::get_stock_history))
        .route("/api/market/status", get(routes::market_status))
        .route("/ws", get(ws::upgrade))
        .with_state(state)
}

/// REST and WebSocket HTTP server.
pub struct ApiServer {
    port: u16,
    state: Arc<ApiState>,
    cancel: CancellationToken,
}

impl ApiServer {
    /// Create a server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<ApiState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Bind and serve until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ApiServerError` if binding fails or the server stops with an
    /// error.
    pub async fn run(self) -> Result<(), ApiServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| ApiServerError::ServerFailed(e.to_string()))?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

/// API server errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}
