//! Background Tasks Module
//!
//! Periodic sweeps that keep the response cache and the rate limiter from
//! growing without bound.

mod sweep;

pub use sweep::{spawn_bucket_sweep, spawn_cache_sweep, Sweepers};
