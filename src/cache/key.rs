//! Cache key layout: `{METHOD}:{path+query}:{identity}`.
//!
//! The identity is `anonymous` for requests without an authenticated user
//! and `user={id}` otherwise, with the id percent-encoded so it never holds
//! a `:`. The query string is kept verbatim apart from a dangling `?`, so
//! `?a=1&b=2` and `?b=2&a=1` are separate entries.

use std::borrow::Cow;

use axum::http::Method;

/// Identity segment used for unauthenticated requests.
pub const ANONYMOUS: &str = "anonymous";

/// Prefix of the identity segment of an authenticated user.
const USER_PREFIX: &str = "user=";

/// Builds the cache key for a request.
pub fn cache_key(method: &Method, path_and_query: &str, user_id: Option<&str>) -> String {
    let path_and_query = path_and_query
        .strip_suffix('?')
        .unwrap_or(path_and_query);
    format!(
        "{}:{}:{}",
        method.as_str(),
        path_and_query,
        identity_segment(user_id)
    )
}

fn identity_segment(user_id: Option<&str>) -> Cow<'static, str> {
    match user_id {
        Some(id) => Cow::Owned(format!("{}{}", USER_PREFIX, urlencoding::encode(id))),
        None => Cow::Borrowed(ANONYMOUS),
    }
}

/// Borrowed view of a key produced by [`cache_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts<'a> {
    pub method: &'a str,
    /// Path without the query string
    pub path: &'a str,
    /// Encoded identity segment
    pub identity: &'a str,
}

impl<'a> KeyParts<'a> {
    /// Splits a key. Returns `None` for keys not shaped like [`cache_key`] output.
    pub fn parse(key: &'a str) -> Option<Self> {
        let (method, rest) = key.split_once(':')?;
        let (path_and_query, identity) = rest.rsplit_once(':')?;
        let path = path_and_query
            .split_once('?')
            .map_or(path_and_query, |(path, _)| path);

        Some(Self {
            method,
            path,
            identity,
        })
    }

    /// Decoded user id, `None` for the anonymous partition.
    pub fn user_id(&self) -> Option<Cow<'a, str>> {
        let encoded = self.identity.strip_prefix(USER_PREFIX)?;
        urlencoding::decode(encoded).ok()
    }

    /// True when the path is `collection` itself or lies under `collection/id`.
    pub fn is_entity(&self, collection: &str, id: &str) -> bool {
        let collection = collection.trim_end_matches('/');
        if self.path == collection {
            return true;
        }

        let Some(rest) = self.path.strip_prefix(collection) else {
            return false;
        };
        let Some(rest) = rest.strip_prefix('/') else {
            return false;
        };
        match rest.strip_prefix(id) {
            Some(tail) => tail.is_empty() || tail.starts_with('/'),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(
            cache_key(&Method::GET, "/items/42?full=1", Some("u-7")),
            "GET:/items/42?full=1:user=u-7"
        );
        assert_eq!(
            cache_key(&Method::GET, "/items", None),
            "GET:/items:anonymous"
        );
    }

    #[test]
    fn test_dangling_question_mark_dropped() {
        assert_eq!(
            cache_key(&Method::GET, "/items/42?", None),
            cache_key(&Method::GET, "/items/42", None)
        );
        assert_ne!(
            cache_key(&Method::GET, "/items?a=1&b=2", None),
            cache_key(&Method::GET, "/items?b=2&a=1", None)
        );
    }

    #[test]
    fn test_distinct_users_never_collide() {
        let a = cache_key(&Method::GET, "/items/1", Some("alice"));
        let b = cache_key(&Method::GET, "/items/1", Some("bob"));
        assert_ne!(a, b);
        assert_eq!(
            cache_key(&Method::GET, "/items/1", None),
            cache_key(&Method::GET, "/items/1", None)
        );
    }

    #[test]
    fn test_user_named_anonymous_has_own_partition() {
        assert_ne!(
            cache_key(&Method::GET, "/items/1", Some(ANONYMOUS)),
            cache_key(&Method::GET, "/items/1", None)
        );
    }

    #[test]
    fn test_parse() {
        let parts = KeyParts::parse("GET:/items/42?x=1:user=alice").unwrap();
        assert_eq!(parts.method, "GET");
        assert_eq!(parts.path, "/items/42");
        assert_eq!(parts.identity, "user=alice");
        assert_eq!(parts.user_id().as_deref(), Some("alice"));
        assert_eq!(KeyParts::parse("GET:/items:anonymous").unwrap().user_id(), None);
        assert!(KeyParts::parse("garbage").is_none());
    }

    #[test]
    fn test_user_id_with_colon_round_trips() {
        for user in ["org:alice", "google-oauth2:123", "50%:off"] {
            let key = cache_key(&Method::GET, "/items/42?v=1", Some(user));
            let parts = KeyParts::parse(&key).unwrap();
            assert_eq!(parts.path, "/items/42");
            assert_eq!(parts.user_id().as_deref(), Some(user));
        }
    }

    #[test]
    fn test_is_entity_respects_segment_boundaries() {
        let parts = |key| KeyParts::parse(key).unwrap();

        assert!(parts("GET:/items/42:anonymous").is_entity("/items", "42"));
        assert!(parts("GET:/items/42/notes:anonymous").is_entity("/items", "42"));
        assert!(parts("GET:/items?page=2:anonymous").is_entity("/items", "42"));
        assert!(!parts("GET:/items/420:anonymous").is_entity("/items", "42"));
        assert!(!parts("GET:/items/4:anonymous").is_entity("/items", "42"));
        assert!(!parts("GET:/itemsx/42:anonymous").is_entity("/items", "42"));
    }
}
