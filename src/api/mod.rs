//! API Module
//!
//! HTTP handlers and routing for the demo resources and the admin surface.
//!
//! # Endpoints
//! - `/items`, `/items/:id` - Demo item CRUD
//! - `/settings` - Demo settings document
//! - `/dashboard/summary` - Derived item summary
//! - `/admin/...` - Cache and limiter introspection
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
