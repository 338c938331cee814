//! Request matching subsystem.
//!
//! # Data Flow
//! ```text
//! Predicate compilation (at filter config build):
//!     HeaderMatchConfig[]
//!     → matcher.rs (HeaderMatcher per entry)
//!     → AndMatcher, immutable
//!
//! Per request:
//!     request head (method, uri, headers)
//!     → AndMatcher::matches
//!     → probe / not a probe
//! ```
//!
//! # Design Decisions
//! - Predicates compiled once per filter configuration
//! - Deterministic: same input always matches the same way

pub mod matcher;

pub use matcher::{AndMatcher, HeaderKey, HeaderMatcher, MatchRule, Matcher, MatcherError};
