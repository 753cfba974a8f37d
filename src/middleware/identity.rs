//! Client identity resolution.
//!
//! Priority: API key, then authenticated user, then network address. A
//! request carrying none of them maps to the `unknown` sentinel.

use std::fmt;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use sha2::{Digest, Sha256};

/// Header carrying a client API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header consulted for the client address when forwarded headers are trusted.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Hex characters of the API key digest kept in the identity tag.
const API_KEY_FINGERPRINT_LEN: usize = 16;

/// User id attached to request extensions by the upstream auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// Who a request is accounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIdentity {
    /// Truncated SHA-256 fingerprint of the API key; the raw key never leaves this module
    ApiKey(String),
    User(String),
    Address(String),
    Unknown,
}

impl ClientIdentity {
    /// Resolves the identity of a request.
    pub fn resolve<B>(request: &Request<B>, trust_forwarded_for: bool) -> Self {
        if let Some(key) = header_str(request.headers(), API_KEY_HEADER) {
            return Self::ApiKey(fingerprint(key));
        }

        if let Some(AuthenticatedUser(id)) = request.extensions().get::<AuthenticatedUser>() {
            if !id.is_empty() {
                return Self::User(id.clone());
            }
        }

        if trust_forwarded_for {
            let forwarded = header_str(request.headers(), FORWARDED_FOR_HEADER)
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|ip| !ip.is_empty());
            if let Some(ip) = forwarded {
                return Self::Address(ip.to_string());
            }
        }

        if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
            return Self::Address(addr.ip().to_string());
        }

        Self::Unknown
    }

    /// Bucket key for this identity.
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(fp) => write!(f, "apikey:{fp}"),
            Self::User(id) => write!(f, "user:{id}"),
            Self::Address(ip) => write!(f, "ip:{ip}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn fingerprint(api_key: &str) -> String {
    let digest = hex::encode(Sha256::digest(api_key.as_bytes()));
    digest[..API_KEY_FINGERPRINT_LEN].to_string()
}
