//! Route Rate Limit Policy Module
//!
//! Maps an HTTP method and path to a request limit per window.

use axum::http::Method;
use serde::Deserialize;

/// One row of the rate limit table.
///
/// `pattern` is either a path (`/auth/login`) or a `METHOD:prefix`
/// compound (`POST:/items`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimitRule {
    pub pattern: String,
    pub limit: u32,
}

impl RateLimitRule {
    pub fn new(pattern: impl Into<String>, limit: u32) -> Self {
        Self {
            pattern: pattern.into(),
            limit,
        }
    }

    fn compound(&self) -> Option<(&str, &str)> {
        self.pattern.split_once(':')
    }
}

/// Resolves request limits from a pattern table.
///
/// Precedence: exact path, then `METHOD:prefix`, then bare prefix, then the
/// default. Table order only breaks ties within one tier, so a tight limit
/// on an exact path cannot be shadowed by a broader prefix.
#[derive(Debug, Clone)]
pub struct RouteRateLimitResolver {
    rules: Vec<RateLimitRule>,
    default_limit: u32,
}

impl RouteRateLimitResolver {
    pub fn new(rules: Vec<RateLimitRule>, default_limit: u32) -> Self {
        Self {
            rules,
            default_limit,
        }
    }

    pub fn resolve(&self, method: &Method, path: &str) -> u32 {
        let paths = || self.rules.iter().filter(|rule| rule.compound().is_none());

        if let Some(rule) = paths().find(|rule| rule.pattern == path) {
            return rule.limit;
        }

        let compound = self.rules.iter().find(|rule| {
            rule.compound().is_some_and(|(rule_method, prefix)| {
                rule_method.eq_ignore_ascii_case(method.as_str()) && path.starts_with(prefix)
            })
        });
        if let Some(rule) = compound {
            return rule.limit;
        }

        paths()
            .find(|rule| path.starts_with(&rule.pattern))
            .map_or(self.default_limit, |rule| rule.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflicting() -> RouteRateLimitResolver {
        // broad rules listed first on purpose
        RouteRateLimitResolver::new(
            vec![
                RateLimitRule::new("/api", 50),
                RateLimitRule::new("POST:/api/auth", 10),
                RateLimitRule::new("/api/auth/login", 3),
            ],
            100,
        )
    }

    #[test]
    fn test_exact_beats_compound_and_prefix() {
        let resolver = conflicting();
        assert_eq!(resolver.resolve(&Method::POST, "/api/auth/login"), 3);
        assert_eq!(resolver.resolve(&Method::GET, "/api/auth/login"), 3);
    }

    #[test]
    fn test_compound_beats_prefix() {
        let resolver = conflicting();
        assert_eq!(resolver.resolve(&Method::POST, "/api/auth/logout"), 10);
        let lowercase = Method::from_bytes(b"post").unwrap();
        assert_eq!(resolver.resolve(&lowercase, "/api/auth/logout"), 10);
    }

    #[test]
    fn test_prefix_when_method_differs() {
        assert_eq!(conflicting().resolve(&Method::GET, "/api/auth/logout"), 50);
    }

    #[test]
    fn test_default() {
        assert_eq!(conflicting().resolve(&Method::GET, "/health"), 100);
    }

    #[test]
    fn test_first_prefix_in_table_wins() {
        let resolver = RouteRateLimitResolver::new(
            vec![
                RateLimitRule::new("/items", 20),
                RateLimitRule::new("/items/bulk", 2),
            ],
            100,
        );
        assert_eq!(resolver.resolve(&Method::GET, "/items/bulk/7"), 20);
    }
}
