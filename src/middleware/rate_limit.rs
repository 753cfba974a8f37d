//! Fixed-window rate limit middleware.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::clock::ms_to_epoch_secs_ceil;
use crate::error::GuardError;
use crate::middleware::identity::ClientIdentity;
use crate::middleware::GuardState;
use crate::ratelimit::RateDecision;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
/// Window reset instant in epoch seconds.
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Counts the request against its client's quota and rejects it with 429
/// once the quota for the current window is spent.
///
/// Limit headers are set on every response, allowed or not.
pub async fn rate_limit_middleware(
    State(guard): State<GuardState>,
    request: Request,
    next: Next,
) -> Response {
    let identity = ClientIdentity::resolve(&request, guard.trust_forwarded_for);
    if identity == ClientIdentity::Unknown {
        warn!(
            path = %request.uri().path(),
            "no API key, user or client address on request; accounting it to the shared unknown bucket"
        );
    }

    let limit = guard
        .rate_limits
        .resolve(request.method(), request.uri().path());
    let client = identity.tag();
    let decision = guard.buckets.write().await.is_allowed(&client, limit);

    let mut response = if decision.allowed {
        debug!(%client, limit, remaining = decision.remaining, "request admitted");
        next.run(request).await
    } else {
        let retry_after_secs = decision.retry_after_secs.unwrap_or(1);
        warn!(%client, limit, retry_after_secs, "rate limit exceeded");
        GuardError::RateLimited { retry_after_secs }.into_response()
    };

    apply_headers(response.headers_mut(), &decision);
    response
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(
        X_RATELIMIT_RESET,
        HeaderValue::from(ms_to_epoch_secs_ceil(decision.reset_at)),
    );
}
