//! External value resolution for General transformations.
//!
//! General transformations have no program. At learn time a resolver
//! describes the relationship shown by the examples; at execution time it
//! maps individual values that no stored example covers.
//!
//! - [`ValueResolver`]: the capability, injected by callers
//! - [`HttpResolver`]: JSON-over-HTTP client
//! - [`ResilientResolver`]: per-call timeout and retry wrapper
//! - [`StubResolver`]: deterministic in-memory resolver for tests and offline use

#![deny(unsafe_code)]

pub mod error;
pub mod http;
pub mod policy;
pub mod resilient;
pub mod stub;

use serde::Serialize;
use tabulax_model::TransformationExample;

pub use error::{ResolveError, Result};
pub use http::{ENV_API_KEY, ENV_URL, HttpResolver, HttpResolverConfig};
pub use policy::{ResolverPolicy, RetryPolicy};
pub use resilient::ResilientResolver;
pub use stub::StubResolver;

/// One value to resolve, with the context a General transformation carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveRequest {
    /// Relationship recorded at learn time, if any.
    pub description: Option<String>,
    /// Stored example pairs.
    pub examples: Vec<TransformationExample>,
    /// The input value, trimmed.
    pub value: String,
}

impl ResolveRequest {
    pub fn new(
        description: Option<&str>,
        examples: &[TransformationExample],
        value: impl Into<String>,
    ) -> Self {
        Self {
            description: description.map(str::to_string),
            examples: examples.to_vec(),
            value: value.into(),
        }
    }
}

/// The external capability behind General transformations.
pub trait ValueResolver: Send + Sync {
    /// Describes the relationship shown by the examples.
    fn describe(&self, examples: &[TransformationExample]) -> Result<String>;

    /// Maps one value.
    fn resolve(&self, request: &ResolveRequest) -> Result<String>;
}

/// Resolver used when none is configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledResolver;

impl ValueResolver for DisabledResolver {
    fn describe(&self, _examples: &[TransformationExample]) -> Result<String> {
        Err(ResolveError::NotConfigured(format!("set {ENV_URL}")))
    }

    fn resolve(&self, _request: &ResolveRequest) -> Result<String> {
        Err(ResolveError::NotConfigured(format!("set {ENV_URL}")))
    }
}
