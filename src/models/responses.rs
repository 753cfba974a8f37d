//! Response DTOs for the demo API and admin surface
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::ratelimit::RateLimiterStats;

/// A demo resource record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response body for `GET /items`
#[derive(Debug, Clone, Serialize)]
pub struct ItemListResponse {
    pub items: Vec<Item>,
    pub total: usize,
}

impl ItemListResponse {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

/// Response body for `GET /dashboard/summary`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub item_count: usize,
    /// RFC 3339 timestamp of when the summary was computed
    pub generated_at: String,
}

impl DashboardSummary {
    pub fn new(item_count: usize) -> Self {
        Self {
            item_count,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for `GET /admin/stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub cache: CacheStats,
    pub rate_limiter: RateLimiterStats,
}

/// Response body for `DELETE /admin/rate-limit/:client`
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub client: String,
    /// Whether a bucket existed
    pub reset: bool,
}

/// Response body for `DELETE /admin/cache`
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
