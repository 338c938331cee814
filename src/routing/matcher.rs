//! Header predicates selecting health-check probes.
//!
//! # Responsibilities
//! - Match a request header (or `:path`, `:method`, `:authority`)
//! - Exact value, value prefix, or presence rules, optionally inverted
//! - Combine predicates with AND semantics
//!
//! # Design Decisions
//! - Header values compared byte-exact, case-sensitive
//! - Header names normalized by `HeaderName` (case-insensitive)
//! - A header with a non-UTF-8 value never matches a value rule
//! - No regex to guarantee O(n) matching

use axum::http::request::Parts;
use axum::http::HeaderName;
use thiserror::Error;

use crate::config::HeaderMatchConfig;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Parts) -> bool;
}

/// Error building a matcher from configuration.
#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("invalid header name '{0}'")]
    InvalidName(String),

    #[error("header predicate '{0}' sets more than one match rule")]
    Ambiguous(String),
}

/// Which part of the request a predicate reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderKey {
    Path,
    Method,
    Authority,
    Header(HeaderName),
}

impl HeaderKey {
    pub fn parse(name: &str) -> Result<Self, MatcherError> {
        match name {
            ":path" => Ok(Self::Path),
            ":method" => Ok(Self::Method),
            ":authority" => Ok(Self::Authority),
            other => HeaderName::from_bytes(other.as_bytes())
                .map(Self::Header)
                .map_err(|_| MatcherError::InvalidName(other.to_string())),
        }
    }

    fn value<'a>(&self, req: &'a Parts) -> Option<&'a str> {
        match self {
            Self::Path => Some(req.uri.path()),
            Self::Method => Some(req.method.as_str()),
            Self::Authority => req
                .uri
                .authority()
                .map(|a| a.as_str())
                .or_else(|| req.headers.get("host").and_then(|h| h.to_str().ok())),
            Self::Header(name) => req.headers.get(name).and_then(|h| h.to_str().ok()),
        }
    }

    fn is_present(&self, req: &Parts) -> bool {
        match self {
            Self::Header(name) => req.headers.contains_key(name),
            other => other.value(req).is_some(),
        }
    }
}

/// How a header value is compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    Exact(String),
    Prefix(String),
    Present(bool),
}

/// Matches a single header against a rule.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    key: HeaderKey,
    rule: MatchRule,
    invert: bool,
}

impl HeaderMatcher {
    pub fn new(key: HeaderKey, rule: MatchRule) -> Self {
        Self {
            key,
            rule,
            invert: false,
        }
    }

    /// Negate this matcher.
    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    /// Build a matcher from its configuration entry.
    pub fn from_config(config: &HeaderMatchConfig) -> Result<Self, MatcherError> {
        let key = HeaderKey::parse(&config.name)?;

        let rule = match (&config.exact_match, &config.prefix_match, config.present_match) {
            (Some(value), None, None) => MatchRule::Exact(value.clone()),
            (None, Some(prefix), None) => MatchRule::Prefix(prefix.clone()),
            (None, None, Some(present)) => MatchRule::Present(present),
            (None, None, None) => MatchRule::Present(true),
            _ => return Err(MatcherError::Ambiguous(config.name.clone())),
        };

        let matcher = Self::new(key, rule);
        Ok(if config.invert_match { matcher.inverted() } else { matcher })
    }
}

impl Matcher for HeaderMatcher {
    fn matches(&self, req: &Parts) -> bool {
        let matched = match &self.rule {
            MatchRule::Exact(expected) => self.key.value(req) == Some(expected.as_str()),
            MatchRule::Prefix(prefix) => self
                .key
                .value(req)
                .map(|v| v.starts_with(prefix.as_str()))
                .unwrap_or(false),
            MatchRule::Present(present) => self.key.is_present(req) == *present,
        };
        matched != self.invert
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Build from a list of predicate configs.
    pub fn from_config(configs: &[HeaderMatchConfig]) -> Result<Self, MatcherError> {
        let matchers = configs
            .iter()
            .map(|c| HeaderMatcher::from_config(c).map(|m| Box::new(m) as Box<dyn Matcher>))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(matchers))
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &Parts) -> bool {
        // All matchers must pass (AND)
        self.matchers.iter().all(|m| m.matches(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    fn header(name: &str) -> HeaderKey {
        HeaderKey::parse(name).unwrap()
    }

    #[test]
    fn test_exact_header() {
        let matcher = HeaderMatcher::new(header("x-probe"), MatchRule::Exact("lb".into()));

        assert!(matcher.matches(&parts(Request::builder().header("X-Probe", "lb"))));
        assert!(!matcher.matches(&parts(Request::builder().header("x-probe", "LB"))));
        assert!(!matcher.matches(&parts(Request::builder())));
    }

    #[test]
    fn test_prefix_and_path() {
        let ua = HeaderMatcher::new(header("user-agent"), MatchRule::Prefix("ELB-".into()));
        assert!(ua.matches(&parts(Request::builder().header("user-agent", "ELB-HealthChecker/2.0"))));
        assert!(!ua.matches(&parts(Request::builder().header("user-agent", "curl/8"))));

        let path = HeaderMatcher::new(HeaderKey::Path, MatchRule::Exact("/healthcheck".into()));
        assert!(path.matches(&parts(Request::builder().uri("http://example.com/healthcheck?x=1"))));
        assert!(!path.matches(&parts(Request::builder().uri("/healthcheck/deep"))));
    }

    #[test]
    fn test_presence_and_invert() {
        let absent = HeaderMatcher::new(header("x-forwarded-for"), MatchRule::Present(false));
        assert!(absent.matches(&parts(Request::builder())));
        assert!(!absent.matches(&parts(Request::builder().header("x-forwarded-for", "1.2.3.4"))));

        let not_get = HeaderMatcher::new(HeaderKey::Method, MatchRule::Exact("GET".into())).inverted();
        assert!(not_get.matches(&parts(Request::builder().method("HEAD"))));
        assert!(!not_get.matches(&parts(Request::builder().method("GET"))));
    }

    #[test]
    fn test_authority_falls_back_to_host() {
        let matcher = HeaderMatcher::new(HeaderKey::Authority, MatchRule::Exact("svc.local".into()));
        assert!(matcher.matches(&parts(Request::builder().uri("http://svc.local/"))));
        assert!(matcher.matches(&parts(Request::builder().uri("/").header("host", "svc.local"))));
    }

    #[test]
    fn test_and_from_config() {
        let configs = vec![
            HeaderMatchConfig {
                name: ":path".into(),
                exact_match: Some("/healthz".into()),
                prefix_match: None,
                present_match: None,
                invert_match: false,
            },
            HeaderMatchConfig {
                name: "x-envoy-internal".into(),
                exact_match: None,
                prefix_match: None,
                present_match: None,
                invert_match: true,
            },
        ];
        let matcher = AndMatcher::from_config(&configs).unwrap();

        assert!(matcher.matches(&parts(Request::builder().uri("/healthz"))));
        assert!(!matcher.matches(&parts(Request::builder().uri("/healthz").header("x-envoy-internal", "true"))));
        assert!(!matcher.matches(&parts(Request::builder().uri("/"))));
    }

    #[test]
    fn test_from_config_rejects() {
        let bad = HeaderMatchConfig {
            name: "x".into(),
            exact_match: Some("a".into()),
            prefix_match: None,
            present_match: Some(true),
            invert_match: false,
        };
        assert!(matches!(HeaderMatcher::from_config(&bad), Err(MatcherError::Ambiguous(_))));
        assert!(matches!(HeaderKey::parse("no spaces"), Err(MatcherError::InvalidName(_))));
    }
}
