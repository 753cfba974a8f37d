//! API Handlers
//!
//! Demo resource handlers sitting behind the guard layers, plus the admin
//! introspection endpoints. Every successful write calls the matching
//! invalidation hook before it returns.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::CacheInvalidator;
use crate::config::Config;
use crate::error::{GuardError, Result};
use crate::middleware::GuardState;
use crate::models::{
    CreateItemRequest, DashboardSummary, HealthResponse, Item, ItemListResponse, MessageResponse,
    ResetResponse, StatsResponse, UpdateItemRequest,
};
use crate::ratelimit::RateUsage;

const ITEMS: &str = "/items";
const SETTINGS: &str = "/settings";
const DASHBOARD: &str = "/dashboard";

/// In-memory records backing the demo endpoints.
#[derive(Debug)]
pub struct DemoData {
    items: BTreeMap<u64, Item>,
    next_id: u64,
    settings: Map<String, Value>,
}

impl Default for DemoData {
    fn default() -> Self {
        let mut settings = Map::new();
        settings.insert("theme".to_string(), json!("light"));
        settings.insert("notifications".to_string(), json!(true));
        Self {
            items: BTreeMap::new(),
            next_id: 1,
            settings,
        }
    }
}

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Stores and policies used by the middleware
    pub guard: GuardState,
    pub invalidator: CacheInvalidator,
    pub data: Arc<RwLock<DemoData>>,
}

impl AppState {
    pub fn new(guard: GuardState) -> Self {
        Self {
            invalidator: guard.invalidator(),
            guard,
            data: Arc::new(RwLock::new(DemoData::default())),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(GuardState::from_config(config))
    }
}

// == Demo Resources ==

/// Handler for GET /items
pub async fn list_items(State(state): State<AppState>) -> Json<ItemListResponse> {
    let data = state.data.read().await;
    Json(ItemListResponse::new(data.items.values().cloned().collect()))
}

/// Handler for GET /items/:id
pub async fn get_item(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<Item>> {
    let data = state.data.read().await;
    data.items
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| GuardError::NotFound(format!("item {}", id)))
}

/// Handler for POST /items
pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>)> {
    if let Some(error_msg) = req.validate() {
        return Err(GuardError::InvalidRequest(error_msg));
    }

    let item = {
        let mut data = state.data.write().await;
        let id = data.next_id;
        data.next_id += 1;
        let item = Item {
            id,
            name: req.name,
            description: req.description,
        };
        data.items.insert(id, item.clone());
        item
    };

    invalidate_item(&state, item.id).await;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for PUT /items/:id
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<Item>> {
    if let Some(error_msg) = req.validate() {
        return Err(GuardError::InvalidRequest(error_msg));
    }

    let item = {
        let mut data = state.data.write().await;
        let item = data
            .items
            .get_mut(&id)
            .ok_or_else(|| GuardError::NotFound(format!("item {}", id)))?;
        if let Some(name) = req.name {
            item.name = name;
        }
        if req.description.is_some() {
            item.description = req.description;
        }
        item.clone()
    };

    invalidate_item(&state, id).await;
    Ok(Json(item))
}

/// Handler for DELETE /items/:id
pub async fn delete_item(State(state): State<AppState>, Path(id): Path<u64>) -> Result<StatusCode> {
    let removed = state.data.write().await.items.remove(&id);
    if removed.is_none() {
        return Err(GuardError::NotFound(format!("item {}", id)));
    }

    invalidate_item(&state, id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// The item itself, its listing and the dashboard all derive from item data.
async fn invalidate_item(state: &AppState, id: u64) {
    state.invalidator.entity(ITEMS, &id.to_string()).await;
    state.invalidator.prefix(DASHBOARD).await;
}

/// Handler for GET /settings
pub async fn get_settings(State(state): State<AppState>) -> Json<Value> {
    Json(Value::Object(state.data.read().await.settings.clone()))
}

/// Handler for PUT /settings
///
/// Merges the given keys into the stored settings.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>> {
    let Value::Object(patch) = patch else {
        return Err(GuardError::InvalidRequest(
            "Settings must be a JSON object".to_string(),
        ));
    };

    let settings = {
        let mut data = state.data.write().await;
        data.settings.extend(patch);
        data.settings.clone()
    };

    state.invalidator.path(SETTINGS).await;
    Ok(Json(Value::Object(settings)))
}

/// Handler for GET /dashboard/summary
pub async fn dashboard_summary(State(state): State<AppState>) -> Json<DashboardSummary> {
    let count = state.data.read().await.items.len();
    Json(DashboardSummary::new(count))
}

// == Admin ==

/// Handler for GET /admin/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let (cache, rate_limiter) = state.guard.stats().await;
    Json(StatsResponse {
        cache,
        rate_limiter,
    })
}

/// Handler for GET /admin/rate-limit/:client
pub async fn usage_handler(
    State(state): State<AppState>,
    Path(client): Path<String>,
) -> Result<Json<RateUsage>> {
    state
        .guard
        .buckets
        .read()
        .await
        .usage(&client)
        .map(Json)
        .ok_or_else(|| GuardError::NotFound(format!("no active window for client {}", client)))
}

/// Handler for DELETE /admin/rate-limit/:client
pub async fn reset_handler(
    State(state): State<AppState>,
    Path(client): Path<String>,
) -> Json<ResetResponse> {
    let reset = state.guard.buckets.write().await.reset(&client);
    info!(%client, reset, "rate limit bucket reset");
    Json(ResetResponse { client, reset })
}

/// Handler for DELETE /admin/cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.guard.cache.write().await.clear();
    info!("response cache cleared");
    Json(MessageResponse::new("Cache cleared"))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
