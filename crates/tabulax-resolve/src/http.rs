//! JSON-over-HTTP resolver client.
//!
//! - `POST {base}/describe` with `{"examples": [{"source", "target"}]}`
//!   answers `{"description": "..."}`
//! - `POST {base}/resolve` with `{"description", "examples", "value"}`
//!   answers `{"value": "..."}`

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tabulax_model::TransformationExample;
use tracing::{debug, trace};

use crate::{ResolveError, ResolveRequest, Result, ValueResolver};

/// Environment variable holding the resolver base URL.
pub const ENV_URL: &str = "TABULAX_RESOLVER_URL";

/// Environment variable holding the optional bearer token.
pub const ENV_API_KEY: &str = "TABULAX_RESOLVER_API_KEY";

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpResolver`].
#[derive(Clone, PartialEq, Eq)]
pub struct HttpResolverConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Connect directly, ignoring proxy environment variables.
    pub direct: bool,
}

impl HttpResolverConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: REQUEST_TIMEOUT,
            direct: false,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn direct(mut self) -> Self {
        self.direct = true;
        self
    }

    /// Reads `TABULAX_RESOLVER_URL` and `TABULAX_RESOLVER_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let base_url = read(ENV_URL)
            .ok_or_else(|| ResolveError::NotConfigured(format!("{ENV_URL} is not set")))?;
        let mut config = Self::new(base_url.trim());
        config.api_key = read(ENV_API_KEY);
        Ok(config)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for HttpResolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResolverConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("direct", &self.direct)
            .finish()
    }
}

#[derive(Serialize)]
struct DescribeBody<'a> {
    examples: &'a [TransformationExample],
}

#[derive(Deserialize)]
struct DescribeReply {
    description: String,
}

#[derive(Deserialize)]
struct ResolveReply {
    value: String,
}

/// Blocking HTTP client for an external resolver service.
#[derive(Debug)]
pub struct HttpResolver {
    client: Client,
    config: HttpResolverConfig,
}

impl HttpResolver {
    pub fn new(config: HttpResolverConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout);
        if config.direct {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| ResolveError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpResolverConfig {
        &self.config
    }

    fn post<B: Serialize + ?Sized, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = self.config.endpoint(path);
        debug!(%url, "calling resolver");

        let mut request = self
            .client
            .post(&url)
            .header(USER_AGENT, concat!("tabulax/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json")
            .json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ResolveError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let reply = response
            .json::<R>()
            .map_err(|e| ResolveError::InvalidResponse(e.to_string()))?;
        trace!(%url, status = status.as_u16(), "resolver replied");
        Ok(reply)
    }

    fn transport_error(&self, err: &reqwest::Error) -> ResolveError {
        if err.is_timeout() {
            ResolveError::Timeout(self.config.timeout)
        } else {
            ResolveError::Transport(err.to_string())
        }
    }
}

impl ValueResolver for HttpResolver {
    fn describe(&self, examples: &[TransformationExample]) -> Result<String> {
        let reply: DescribeReply = self.post("describe", &DescribeBody { examples })?;
        non_blank(reply.description, "description")
    }

    fn resolve(&self, request: &ResolveRequest) -> Result<String> {
        let reply: ResolveReply = self.post("resolve", request)?;
        non_blank(reply.value, "value")
    }
}

fn non_blank(text: String, field: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::InvalidResponse(format!("empty {field}")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup() {
        let config = HttpResolverConfig::from_lookup(|key| match key {
            ENV_URL => Some("http://localhost:8080/".to_string()),
            ENV_API_KEY => Some("  ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/");
        assert_eq!(config.api_key, None);
        assert_eq!(config.endpoint("resolve"), "http://localhost:8080/resolve");
    }

    #[test]
    fn test_missing_url() {
        let err = HttpResolverConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, ResolveError::NotConfigured(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = HttpResolverConfig::new("http://x").with_api_key("secret");
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(" Tokyo ".to_string(), "value").unwrap(), "Tokyo");
        assert!(non_blank("  ".to_string(), "value").is_err());
    }
}
