//! Route Cache Policy Module
//!
//! Maps an HTTP method and path to a caching decision.

use axum::http::Method;
use serde::Deserialize;

// == Cache Policy ==
/// Caching decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Do not read or populate the cache
    Skip,
    /// Cache a successful response for this many milliseconds
    Ttl(u64),
}

// == Cache Route Rule ==
/// One row of the cache policy table.
///
/// Deserializes from `{"prefix": "/items", "ttl_ms": 60000}` or
/// `{"prefix": "/admin", "skip": true}`. A row with neither falls back to
/// the resolver's default TTL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheRouteRule {
    pub prefix: String,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl CacheRouteRule {
    pub fn ttl(prefix: impl Into<String>, ttl_ms: u64) -> Self {
        Self {
            prefix: prefix.into(),
            skip: false,
            ttl_ms: Some(ttl_ms),
        }
    }

    pub fn skip(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            skip: true,
            ttl_ms: None,
        }
    }

    /// The rule's own decision, `None` when it defers to the default TTL.
    pub fn policy(&self) -> Option<CachePolicy> {
        if self.skip {
            Some(CachePolicy::Skip)
        } else {
            self.ttl_ms.map(CachePolicy::Ttl)
        }
    }
}

// == Resolver ==
/// Resolves cache policies from an ordered prefix table.
///
/// The first prefix the path starts with wins, so an early short prefix
/// shadows any longer prefix listed after it.
#[derive(Debug, Clone)]
pub struct RouteCachePolicyResolver {
    rules: Vec<CacheRouteRule>,
    default_ttl_ms: u64,
}

impl RouteCachePolicyResolver {
    pub fn new(rules: Vec<CacheRouteRule>, default_ttl_ms: u64) -> Self {
        Self {
            rules,
            default_ttl_ms,
        }
    }

    /// Resolves the policy for a request.
    ///
    /// Write methods always skip the cache.
    pub fn resolve(&self, method: &Method, path: &str) -> CachePolicy {
        if is_mutation(method) {
            return CachePolicy::Skip;
        }

        self.rules
            .iter()
            .find(|rule| path.starts_with(&rule.prefix))
            .and_then(CacheRouteRule::policy)
            .unwrap_or(CachePolicy::Ttl(self.default_ttl_ms))
    }
}

/// Returns true for create/update/delete style methods.
pub fn is_mutation(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
