//! API Routes
//!
//! Configures the Axum router: demo resources and admin endpoints wrapped in
//! the guard layers, then CORS and request tracing.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, create_item, dashboard_summary, delete_item, get_item, get_settings,
    health_handler, list_items, reset_handler, stats_handler, update_item, update_settings,
    usage_handler, AppState,
};
use crate::middleware::guard_layers;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET/POST /items`, `GET/PUT/DELETE /items/:id`
/// - `GET/PUT /settings`
/// - `GET /dashboard/summary`
/// - `GET /admin/stats`
/// - `GET/DELETE /admin/rate-limit/:client`
/// - `DELETE /admin/cache`
/// - `GET /health`
///
/// # Middleware
/// - Rate limiting, then response caching (see [`guard_layers`])
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/settings", get(get_settings).put(update_settings))
        .route("/dashboard/summary", get(dashboard_summary))
        .route("/admin/stats", get(stats_handler))
        .route(
            "/admin/rate-limit/:client",
            get(usage_handler).delete(reset_handler),
        )
        .route("/admin/cache", delete(clear_cache_handler))
        .route("/health", get(health_handler));

    guard_layers(routes, state.guard.clone())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
