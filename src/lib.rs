//! Route Guard - response caching and per-client rate limiting for axum
//!
//! Provides an in-memory LRU/TTL response cache and a fixed-window rate
//! limiter as middleware, plus a small demo service wired through both.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod ratelimit;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{GuardError, Result};
pub use middleware::{guard_layers, GuardState};
pub use tasks::Sweepers;
