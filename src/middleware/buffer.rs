//! Response buffering for the cache middleware.
//!
//! The caching decision needs the complete body, so a handler's response is
//! collected into a [`BufferedResponse`] and turned back into a response with
//! [`BufferedResponse::finalize`] once the decision is made.

use axum::body::{to_bytes, Body, Bytes, HttpBody};
use axum::http::{response::Parts, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use serde_json::Value;

use crate::error::{GuardError, Result};

/// Outcome of trying to buffer a response.
#[derive(Debug)]
pub enum Captured {
    /// Body fully read into memory
    Buffered(BufferedResponse),
    /// Body of unknown or oversized length, returned untouched
    Passthrough(Response),
}

/// A response whose body has been read into memory.
#[derive(Debug)]
pub struct BufferedResponse {
    parts: Parts,
    body: Bytes,
}

impl BufferedResponse {
    /// Buffers `response` if its body has an exact size of at most `max_bytes`.
    pub async fn capture(response: Response, max_bytes: usize) -> Result<Captured> {
        let fits = response
            .body()
            .size_hint()
            .exact()
            .is_some_and(|len| len <= max_bytes as u64);
        if !fits {
            return Ok(Captured::Passthrough(response));
        }

        let (parts, body) = response.into_parts();
        let body = to_bytes(body, max_bytes)
            .await
            .map_err(|e| GuardError::BodyRead(e.to_string()))?;
        Ok(Captured::Buffered(Self { parts, body }))
    }

    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parses the body as JSON, `None` when it is not valid JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.parts.headers.insert(name, value);
    }

    /// Rebuilds the response with the buffered body.
    pub fn finalize(self) -> Response {
        Response::from_parts(self.parts, Body::from(self.body))
    }
}
