//! Integration Tests for the guard layers
//!
//! Drives full request/response cycles through the rate limit and cache
//! middleware, both on bare counting handlers and on the demo router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Request},
    http::{Method, StatusCode},
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use route_guard::{
    create_router, guard_layers, middleware::AuthenticatedUser, ratelimit::RateLimitRule,
    AppState, Config, GuardState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn config_with_limit(limit: u32) -> Config {
    Config {
        rate_limit_default: limit,
        rate_limit_routes: Vec::new(),
        ..Config::default()
    }
}

/// `/items/:id` handlers that count their invocations, wrapped in the guard layers.
///
/// The POST handler invalidates the entity the way a real write path does.
fn counting_app(guard: GuardState) -> (Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let get_calls = calls.clone();
    let post_calls = calls.clone();
    let invalidator = guard.invalidator();

    let routes = Router::new().route(
        "/items/:id",
        get(move |Path(id): Path<u64>| {
            let calls = get_calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Json(json!({"id": id, "name": "Item"}))
            }
        })
        .post(move |Path(id): Path<u64>| {
            let calls = post_calls.clone();
            let invalidator = invalidator.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                invalidator.entity("/items", &id.to_string()).await;
                (StatusCode::CREATED, Json(json!({"id": id})))
            }
        }),
    );

    (guard_layers(routes, guard), calls)
}

/// Maps an `x-user-id` header to the [`AuthenticatedUser`] extension.
async fn fake_auth(mut request: Request, next: Next) -> Response {
    let user = request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Some(user) = user {
        request.extensions_mut().insert(AuthenticatedUser(user));
    }
    next.run(request).await
}

async fn send(app: &Router, method: Method, uri: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_to_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

// == Caching ==

#[tokio::test]
async fn test_cache_round_trip() {
    let (app, calls) = counting_app(GuardState::from_config(&Config::default()));

    let first = send(&app, Method::GET, "/items/42", &[]).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header(&first, "x-cache"), Some("MISS"));
    let first_body = body_to_json(first).await;
    assert_eq!(first_body, json!({"id": 42, "name": "Item"}));

    let second = send(&app, Method::GET, "/items/42", &[]).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(header(&second, "x-cache"), Some("HIT"));
    assert_eq!(body_to_json(second).await, first_body);

    assert_eq!(calls.load(Ordering::SeqCst), 1, "hit must not reach the handler");
}

#[tokio::test]
async fn test_post_invalidates_entity() {
    let (app, calls) = counting_app(GuardState::from_config(&Config::default()));

    send(&app, Method::GET, "/items/42", &[]).await;
    let hit = send(&app, Method::GET, "/items/42", &[]).await;
    assert_eq!(header(&hit, "x-cache"), Some("HIT"));

    let posted = send(&app, Method::POST, "/items/42", &[]).await;
    assert_eq!(posted.status(), StatusCode::CREATED);

    let after = send(&app, Method::GET, "/items/42", &[]).await;
    assert_eq!(header(&after, "x-cache"), Some("MISS"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_query_strings_are_separate_entries() {
    let (app, calls) = counting_app(GuardState::from_config(&Config::default()));

    send(&app, Method::GET, "/items/1?view=full", &[]).await;
    let other = send(&app, Method::GET, "/items/1?view=short", &[]).await;
    assert_eq!(header(&other, "x-cache"), Some("MISS"));

    let repeat = send(&app, Method::GET, "/items/1?view=full", &[]).await;
    assert_eq!(header(&repeat, "x-cache"), Some("HIT"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_partitioned_by_user() {
    let (app, calls) = counting_app(GuardState::from_config(&Config::default()));
    let app = app.layer(from_fn(fake_auth));

    let alice = send(&app, Method::GET, "/items/7", &[("x-user-id", "alice")]).await;
    assert_eq!(header(&alice, "x-cache"), Some("MISS"));

    let bob = send(&app, Method::GET, "/items/7", &[("x-user-id", "bob")]).await;
    assert_eq!(header(&bob, "x-cache"), Some("MISS"));

    let alice_again = send(&app, Method::GET, "/items/7", &[("x-user-id", "alice")]).await;
    assert_eq!(header(&alice_again, "x-cache"), Some("HIT"));

    let anonymous = send(&app, Method::GET, "/items/7", &[]).await;
    assert_eq!(header(&anonymous, "x-cache"), Some("MISS"));

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_user_named_anonymous_does_not_share_anonymous_partition() {
    let (app, calls) = counting_app(GuardState::from_config(&Config::default()));
    let app = app.layer(from_fn(fake_auth));

    let public = send(&app, Method::GET, "/items/9", &[]).await;
    assert_eq!(header(&public, "x-cache"), Some("MISS"));

    let named = send(&app, Method::GET, "/items/9", &[("x-user-id", "anonymous")]).await;
    assert_eq!(header(&named, "x-cache"), Some("MISS"));

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_post_invalidates_entity_for_user_id_with_colon() {
    let (app, calls) = counting_app(GuardState::from_config(&Config::default()));
    let app = app.layer(from_fn(fake_auth));
    let user = [("x-user-id", "org:alice")];

    send(&app, Method::GET, "/items/42", &user).await;
    let hit = send(&app, Method::GET, "/items/42", &user).await;
    assert_eq!(header(&hit, "x-cache"), Some("HIT"));

    send(&app, Method::POST, "/items/42", &[]).await;

    let after = send(&app, Method::GET, "/items/42", &user).await;
    assert_eq!(header(&after, "x-cache"), Some("MISS"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_trailing_question_mark_shares_entry() {
    let (app, calls) = counting_app(GuardState::from_config(&Config::default()));

    send(&app, Method::GET, "/items/42", &[]).await;
    let dangling = send(&app, Method::GET, "/items/42?", &[]).await;
    assert_eq!(header(&dangling, "x-cache"), Some("HIT"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_mutations_bypass_cache() {
    let (app, calls) = counting_app(GuardState::from_config(&Config::default()));

    for _ in 0..2 {
        let response = send(&app, Method::POST, "/items/42", &[]).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(header(&response, "x-cache").is_none());
        assert!(header(&response, "x-ratelimit-limit").is_some());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_error_and_non_json_responses_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let missing_calls = calls.clone();
    let text_calls = calls.clone();
    let routes = Router::new()
        .route(
            "/items/missing",
            get(move || {
                let calls = missing_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::NOT_FOUND, Json(json!({"error": "missing"}))).into_response()
                }
            }),
        )
        .route(
            "/items/text",
            get(move || {
                let calls = text_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "plain text"
                }
            }),
        );
    let guard = GuardState::from_config(&Config::default());
    let app = guard_layers(routes, guard.clone());

    for _ in 0..2 {
        let missing = send(&app, Method::GET, "/items/missing", &[]).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(header(&missing, "x-cache").is_none());

        let text = send(&app, Method::GET, "/items/text", &[]).await;
        assert_eq!(text.status(), StatusCode::OK);
        assert!(header(&text, "x-cache").is_none());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert!(guard.cache.read().await.is_empty());
}

#[tokio::test]
async fn test_update_invalidates_cached_item() {
    let app = create_router(AppState::from_config(&Config::default()));

    let created = send_json(&app, Method::POST, "/items", json!({"name": "widget"})).await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let miss = send(&app, Method::GET, "/items/1", &[]).await;
    assert_eq!(header(&miss, "x-cache"), Some("MISS"));
    let hit = send(&app, Method::GET, "/items/1", &[]).await;
    assert_eq!(header(&hit, "x-cache"), Some("HIT"));

    let updated = send_json(&app, Method::PUT, "/items/1", json!({"name": "gadget"})).await;
    assert_eq!(updated.status(), StatusCode::OK);

    let refreshed = send(&app, Method::GET, "/items/1", &[]).await;
    assert_eq!(header(&refreshed, "x-cache"), Some("MISS"));
    assert_eq!(body_to_json(refreshed).await["name"], "gadget");
}

#[tokio::test]
async fn test_create_invalidates_listing_and_dashboard() {
    let app = create_router(AppState::from_config(&Config::default()));

    let list = send(&app, Method::GET, "/items", &[]).await;
    assert_eq!(body_to_json(list).await["total"], 0);
    let summary = send(&app, Method::GET, "/dashboard/summary", &[]).await;
    assert_eq!(body_to_json(summary).await["itemCount"], 0);

    send_json(&app, Method::POST, "/items", json!({"name": "widget"})).await;

    let list = send(&app, Method::GET, "/items", &[]).await;
    assert_eq!(header(&list, "x-cache"), Some("MISS"));
    assert_eq!(body_to_json(list).await["total"], 1);

    let summary = send(&app, Method::GET, "/dashboard/summary", &[]).await;
    assert_eq!(header(&summary, "x-cache"), Some("MISS"));
    assert_eq!(body_to_json(summary).await["itemCount"], 1);
}

#[tokio::test]
async fn test_settings_update_invalidates() {
    let app = create_router(AppState::from_config(&Config::default()));

    send(&app, Method::GET, "/settings", &[]).await;
    let hit = send(&app, Method::GET, "/settings", &[]).await;
    assert_eq!(header(&hit, "x-cache"), Some("HIT"));

    let updated = send_json(&app, Method::PUT, "/settings", json!({"theme": "dark"})).await;
    assert_eq!(updated.status(), StatusCode::OK);

    let fresh = send(&app, Method::GET, "/settings", &[]).await;
    assert_eq!(header(&fresh, "x-cache"), Some("MISS"));
    assert_eq!(body_to_json(fresh).await["theme"], "dark");
}

// == Rate Limiting ==

#[tokio::test]
async fn test_throttle_after_limit() {
    let app = create_router(AppState::from_config(&config_with_limit(3)));
    let key = [("x-api-key", "client-secret")];

    for expected_remaining in ["2", "1", "0"] {
        let response = send(&app, Method::GET, "/health", &key).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "x-ratelimit-limit"), Some("3"));
        assert_eq!(header(&response, "x-ratelimit-remaining"), Some(expected_remaining));
        assert!(header(&response, "x-ratelimit-reset").is_some());
    }

    let rejected = send(&app, Method::GET, "/health", &key).await;
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header(&rejected, "x-ratelimit-remaining"), Some("0"));
    let retry_after: u64 = header(&rejected, "retry-after").unwrap().parse().unwrap();
    assert!(retry_after > 0 && retry_after <= 60);

    let body = body_to_json(rejected).await;
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(body["retryAfter"], retry_after);
}

#[tokio::test]
async fn test_clients_have_independent_buckets() {
    let app = create_router(AppState::from_config(&config_with_limit(1)));

    let first = send(&app, Method::GET, "/health", &[("x-api-key", "one")]).await;
    assert_eq!(first.status(), StatusCode::OK);
    let throttled = send(&app, Method::GET, "/health", &[("x-api-key", "one")]).await;
    assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);

    let other = send(&app, Method::GET, "/health", &[("x-api-key", "two")]).await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_for_used_when_trusted() {
    let config = Config {
        trust_forwarded_for: true,
        ..config_with_limit(1)
    };
    let app = create_router(AppState::from_config(&config));

    let a = send(&app, Method::GET, "/health", &[("x-forwarded-for", "203.0.113.1")]).await;
    let b = send(&app, Method::GET, "/health", &[("x-forwarded-for", "203.0.113.2, 10.0.0.1")]).await;
    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);

    let a_again = send(&app, Method::GET, "/health", &[("x-forwarded-for", "203.0.113.1")]).await;
    assert_eq!(a_again.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_route_specific_limit() {
    let config = Config {
        rate_limit_routes: vec![RateLimitRule::new("POST:/items", 1)],
        ..config_with_limit(100)
    };
    let app = create_router(AppState::from_config(&config));
    let key = [("x-api-key", "writer")];

    let read = send(&app, Method::GET, "/items", &key).await;
    assert_eq!(header(&read, "x-ratelimit-limit"), Some("100"));

    let post = send_json(&app, Method::POST, "/items", json!({"name": "a"})).await;
    assert_eq!(header(&post, "x-ratelimit-limit"), Some("1"));
}

// == Admin ==

#[tokio::test]
async fn test_admin_reset_restores_quota() {
    let config = Config {
        rate_limit_routes: vec![RateLimitRule::new("/admin", 100)],
        ..config_with_limit(1)
    };
    let app = create_router(AppState::from_config(&config));
    let key = [("x-api-key", "client-secret")];

    send(&app, Method::GET, "/health", &key).await;
    let throttled = send(&app, Method::GET, "/health", &key).await;
    assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);

    let stats = body_to_json(send(&app, Method::GET, "/admin/stats", &[]).await).await;
    assert!(stats["rateLimiter"]["activeBuckets"].as_u64().unwrap() >= 1);

    let client = format!("apikey:{}", &sha256_hex("client-secret")[..16]);
    let reset = send(&app, Method::DELETE, &format!("/admin/rate-limit/{client}"), &[]).await;
    assert_eq!(reset.status(), StatusCode::OK);
    assert_eq!(body_to_json(reset).await["reset"], true);

    let allowed = send(&app, Method::GET, "/health", &key).await;
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_clear_cache() {
    let app = create_router(AppState::from_config(&Config::default()));

    send(&app, Method::GET, "/items", &[]).await;
    let stats = body_to_json(send(&app, Method::GET, "/admin/stats", &[]).await).await;
    assert_eq!(stats["cache"]["size"], 1);
    assert_eq!(stats["cache"]["misses"], 1);

    let cleared = send(&app, Method::DELETE, "/admin/cache", &[]).await;
    assert_eq!(cleared.status(), StatusCode::OK);

    let stats = body_to_json(send(&app, Method::GET, "/admin/stats", &[]).await).await;
    assert_eq!(stats["cache"]["size"], 0);
}

fn sha256_hex(input: &str) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(input.as_bytes()))
}
