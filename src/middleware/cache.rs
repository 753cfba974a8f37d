//! Response cache middleware.
//!
//! A hit is answered straight from the store and the downstream handler is
//! never called, so anything the handler would do (logging, metrics, side
//! effects) is skipped for that request. A miss runs the handler and stores
//! its body only when the status is `200 OK` and the body is valid JSON.

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, warn};

use crate::cache::{cache_key, CachePolicy};
use crate::middleware::buffer::{BufferedResponse, Captured};
use crate::middleware::identity::AuthenticatedUser;
use crate::middleware::GuardState;

/// Cache status header.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

const HIT: HeaderValue = HeaderValue::from_static("HIT");
const MISS: HeaderValue = HeaderValue::from_static("MISS");

/// Serves cached replays and records cacheable responses.
pub async fn cache_middleware(
    State(guard): State<GuardState>,
    request: Request,
    next: Next,
) -> Response {
    let ttl_ms = match guard
        .cache_policies
        .resolve(request.method(), request.uri().path())
    {
        CachePolicy::Skip => return next.run(request).await,
        CachePolicy::Ttl(ttl_ms) => ttl_ms,
    };

    let uri = request.uri();
    let path_and_query = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str());
    let user_id = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.0.as_str());
    let key = cache_key(request.method(), path_and_query, user_id);

    let cached = guard.cache.write().await.get(&key);
    if let Some(value) = cached {
        debug!(%key, "cache hit");
        return (StatusCode::OK, [(X_CACHE, HIT)], Json(value)).into_response();
    }

    let response = next.run(request).await;

    match BufferedResponse::capture(response, guard.max_body_bytes).await {
        Ok(Captured::Passthrough(response)) => {
            debug!(%key, "response not buffered, skipping cache");
            response
        }
        Ok(Captured::Buffered(mut buffered)) => {
            let payload = (buffered.status() == StatusCode::OK)
                .then(|| buffered.json())
                .flatten();
            match payload {
                Some(value) => {
                    guard.cache.write().await.set(key.clone(), value, Some(ttl_ms));
                    buffered.insert_header(X_CACHE, MISS);
                    debug!(%key, ttl_ms, "cached response");
                }
                None => debug!(%key, status = %buffered.status(), "response not cacheable"),
            }
            buffered.finalize()
        }
        Err(err) => {
            warn!(%key, error = %err, "failed to buffer response");
            err.into_response()
        }
    }
}
