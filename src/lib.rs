//! Inbox Gateway - one JSON-RPC tool surface over several messaging platforms
//!
//! This library exposes the gateway components (adapters, aggregation,
//! audit log, dispatcher and event stream), enabling integration tests and
//! embedding the router in other applications.

pub mod adapters;
pub mod aggregation;
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod rpc;
pub mod service;
pub mod state;
pub mod streamer;

// Re-export key types for convenience
pub use adapters::{AdapterRegistry, PlatformAdapter};
pub use config::Config;
pub use error::{AdapterError, AppError, Result};
pub use handlers::router;
pub use service::GatewayService;
pub use state::AppState;
