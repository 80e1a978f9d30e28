//! Axum-based HTTP server exposing the cache ledger.
//!
//! Every ledger operation (create, get, list, delete, refresh, record hit,
//! stats) and the pricing table are available as synchronous JSON
//! request/response endpoints, alongside health and Prometheus metrics.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual API endpoints.
//! - `middleware`: Request ID propagation and per-route metrics.
//! - `routes`: The main router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::{CacheListResponse, DeleteResponse, HealthResponse, HealthStatus};
pub use routes::{create_router, AppState};
