//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus the servers and process plumbing.

/// Broadcast channel adapters (in-process and Redis pub/sub).
pub mod broadcast;

/// Cache adapters (in-memory and Redis).
pub mod cache;

/// Configuration from environment variables.
pub mod config;

/// Upstream price streamer client and frame decoder.
pub mod feed;

/// Health check HTTP endpoint.
pub mod health;

/// REST and client WebSocket server.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Static NSE symbol reference table.
pub mod reference;

/// OpenTelemetry tracing integration.
pub mod telemetry;

/// Yahoo Finance market data adapter.
pub mod yahoo;
