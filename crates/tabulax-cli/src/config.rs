//! Optional `tabulax.toml` configuration.
//!
//! Values are resolved in order: command-line flags, then the environment
//! (resolver URL and API key only), then this file, then built-in defaults.
//!
//! ```toml
//! [resolver]
//! url = "http://localhost:5001"
//! timeout_secs = 30
//! max_retries = 2
//! initial_backoff_ms = 200
//!
//! [exec]
//! workers = 4
//! deadline_secs = 120
//!
//! [join]
//! max_distance = 1.0
//! ignore_case = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tabulax_exec::ExecOptions;
use tabulax_join::{JoinOptions, UnmatchedPolicy};
use tabulax_resolve::{ENV_API_KEY, HttpResolverConfig, ResolverPolicy};
use tracing::debug;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "tabulax.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub resolver: ResolverSection,
    pub exec: ExecSection,
    pub join: JoinSection,
}

/// External resolver settings. The API key is only read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverSection {
    pub url: Option<String>,
    pub timeout_secs: Option<f64>,
    pub max_retries: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecSection {
    pub workers: Option<usize>,
    pub deadline_secs: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JoinSection {
    pub max_distance: Option<f64>,
    pub ignore_case: Option<bool>,
    pub trim: Option<bool>,
    pub omit_unmatched: Option<bool>,
    pub target_prefix: Option<String>,
    pub workers: Option<usize>,
}

/// Join settings given on the command line. Switches only ever turn a
/// setting on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinFlags {
    pub max_distance: Option<f64>,
    pub ignore_case: bool,
    pub trim: bool,
    pub omit_unmatched: bool,
    pub workers: Option<usize>,
}

impl FileConfig {
    /// Loads `path`, or `tabulax.toml` in the working directory if present.
    ///
    /// An explicit path must exist; the implicit default may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config =
            Self::parse(&text).with_context(|| format!("parse config {}", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Timeout and retry policy for resolver calls.
    pub fn resolver_policy(&self) -> Result<ResolverPolicy> {
        let section = &self.resolver;
        let mut policy = ResolverPolicy::default();
        if let Some(secs) = section.timeout_secs {
            policy.timeout = Some(seconds("resolver.timeout_secs", secs)?);
        }
        if let Some(retries) = section.max_retries {
            policy.retry = policy.retry.with_max_retries(retries);
        }
        if let Some(millis) = section.initial_backoff_ms {
            policy.retry = policy
                .retry
                .with_initial_backoff(Duration::from_millis(millis));
        }
        Ok(policy)
    }

    /// HTTP resolver settings, or `None` when no resolver URL is configured.
    ///
    /// `lookup` reads environment variables; the environment URL wins over
    /// the file.
    pub fn http_resolver(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<HttpResolverConfig>> {
        let mut config = match HttpResolverConfig::from_lookup(&lookup) {
            Ok(config) => config,
            Err(_) => {
                let Some(url) = self.resolver.url.as_deref().filter(|u| !u.trim().is_empty())
                else {
                    return Ok(None);
                };
                let mut config = HttpResolverConfig::new(url.trim());
                config.api_key = lookup(ENV_API_KEY).filter(|key| !key.trim().is_empty());
                config
            }
        };
        if let Some(secs) = self.resolver.timeout_secs {
            config = config.with_timeout(seconds("resolver.timeout_secs", secs)?);
        }
        Ok(Some(config))
    }

    /// Executor options; flags override the `[exec]` section.
    pub fn exec_options(
        &self,
        workers: Option<usize>,
        deadline_secs: Option<f64>,
    ) -> Result<ExecOptions> {
        let mut options = ExecOptions::default();
        if let Some(workers) = workers.or(self.exec.workers) {
            options = options.with_workers(workers);
        }
        if let Some(secs) = deadline_secs.or(self.exec.deadline_secs) {
            options = options.with_timeout(seconds("deadline", secs)?);
        }
        Ok(options)
    }

    /// Join options; flags override the `[join]` section.
    pub fn join_options(&self, flags: &JoinFlags) -> JoinOptions {
        let section = &self.join;
        let mut options = JoinOptions::default();
        if let Some(max) = flags.max_distance.or(section.max_distance) {
            options.max_distance = max;
        }
        options.distance.normalize_case = flags.ignore_case || section.ignore_case == Some(true);
        options.distance.trim_whitespace = flags.trim || section.trim == Some(true);
        if flags.omit_unmatched || section.omit_unmatched == Some(true) {
            options.unmatched = UnmatchedPolicy::Omit;
        }
        if let Some(prefix) = &section.target_prefix {
            options.target_prefix.clone_from(prefix);
        }
        options.workers = flags.workers.or(section.workers);
        options
    }
}

fn seconds(field: &str, secs: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => Ok(duration),
        Err(_) => bail!("{field} must be a non-negative number of seconds, got {secs}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(FileConfig::parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(FileConfig::parse("[exec]\nthreads = 4\n").is_err());
    }

    #[test]
    fn test_flags_win_over_file() {
        let config = FileConfig::parse("[exec]\nworkers = 2\ndeadline_secs = 5.0\n").unwrap();
        let options = config.exec_options(Some(8), None).unwrap();
        assert_eq!(options.workers, Some(8));
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_negative_deadline_is_an_error() {
        let config = FileConfig::default();
        assert!(config.exec_options(None, Some(-1.0)).is_err());
    }

    #[test]
    fn test_resolver_policy_from_file() {
        let config = FileConfig::parse(
            "[resolver]\ntimeout_secs = 1.5\nmax_retries = 0\ninitial_backoff_ms = 10\n",
        )
        .unwrap();
        let policy = config.resolver_policy().unwrap();
        assert_eq!(policy.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(policy.retry.max_retries, 0);
        assert_eq!(policy.retry.initial_backoff, Duration::from_millis(10));
    }

    #[test]
    fn test_environment_url_wins() {
        let config = FileConfig::parse("[resolver]\nurl = \"http://file:1\"\n").unwrap();

        let none = |_: &str| None::<String>;
        let http = config.http_resolver(none).unwrap().unwrap();
        assert_eq!(http.base_url, "http://file:1");
        assert_eq!(http.api_key, None);

        let env = |key: &str| match key {
            "TABULAX_RESOLVER_URL" => Some("http://env:2".to_string()),
            "TABULAX_RESOLVER_API_KEY" => Some("secret".to_string()),
            _ => None,
        };
        let http = config.http_resolver(env).unwrap().unwrap();
        assert_eq!(http.base_url, "http://env:2");
        assert_eq!(http.api_key.as_deref(), Some("secret"));

        assert!(FileConfig::default().http_resolver(none).unwrap().is_none());
    }

    #[test]
    fn test_file_timeout_applies_to_environment_url() {
        let config = FileConfig::parse("[resolver]\ntimeout_secs = 3.0\n").unwrap();
        let env = |key: &str| (key == "TABULAX_RESOLVER_URL").then(|| "http://env:2".to_string());
        let http = config.http_resolver(env).unwrap().unwrap();
        assert_eq!(http.base_url, "http://env:2");
        assert_eq!(http.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_api_key_is_not_read_from_file() {
        assert!(FileConfig::parse("[resolver]\napi_key = \"secret\"\n").is_err());
    }

    #[test]
    fn test_join_switches_combine() {
        let config =
            FileConfig::parse("[join]\nmax_distance = 3.0\ntrim = true\ntarget_prefix = \"t_\"\n")
                .unwrap();
        let options = config.join_options(&JoinFlags {
            ignore_case: true,
            ..JoinFlags::default()
        });
        assert_eq!(options.max_distance, 3.0);
        assert!(options.distance.normalize_case);
        assert!(options.distance.trim_whitespace);
        assert_eq!(options.target_prefix, "t_");
        assert_eq!(options.unmatched, UnmatchedPolicy::Flag);
    }
}
