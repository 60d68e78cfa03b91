//! API Module
//!
//! HTTP handlers and routing for the demo server.
//!
//! # Endpoints
//! - `GET /pageview` - Increment and return the page view counter
//! - `GET /get-cached` - Result of the expensive call, cached with a TTL
//! - `GET /stats` - Memoizer counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
