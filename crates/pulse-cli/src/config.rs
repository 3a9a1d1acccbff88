//! Credential and cache configuration.
//!
//! Values come from a TOML file (`pulse.toml` by default) and are then
//! overridden by the environment variables the dashboards have always read.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "pulse.toml";
pub const DEFAULT_MAILCHIMP_SERVER_PREFIX: &str = "us6";
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing configuration key `{key}` (set {env_var} or add it to the config file)")]
    Missing {
        key: &'static str,
        env_var: &'static str,
    },
}

/// Vendor integrations that need credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    Ga4,
    Mailchimp,
    Twitter,
    Youtube,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Ga4, Source::Mailchimp, Source::Twitter, Source::Youtube];

    pub fn label(self) -> &'static str {
        match self {
            Self::Ga4 => "Google Analytics 4",
            Self::Mailchimp => "MailChimp",
            Self::Twitter => "Twitter/X",
            Self::Youtube => "YouTube",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Ga4Config {
    pub property_id: Option<String>,
    pub service_account_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MailchimpConfig {
    pub api_key: Option<String>,
    pub server_prefix: Option<String>,
    pub list_id: Option<String>,
}

impl MailchimpConfig {
    pub fn server_prefix(&self) -> &str {
        self.server_prefix
            .as_deref()
            .unwrap_or(DEFAULT_MAILCHIMP_SERVER_PREFIX)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub bearer_token: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub api_key: Option<String>,
    pub channel_id: Option<String>,
}

/// Response freshness window for host applications that cache vendor
/// responses. Normalization itself never caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub ga4: Ga4Config,
    pub mailchimp: MailchimpConfig,
    pub twitter: TwitterConfig,
    pub youtube: YoutubeConfig,
    pub cache: CacheConfig,
}

impl PulseConfig {
    pub fn from_toml_str(body: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(body).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path`, or `pulse.toml` in the working directory when present.
    /// An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            debug!("no config file; using defaults");
            return Ok(Self::default());
        }
        let body = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&body, &path)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Applies environment overrides from the process environment.
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env(|name| std::env::var(name).ok())
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(v) = get("GA4_PROPERTY_ID") {
            self.ga4.property_id = Some(v);
        }
        if let Some(v) = get("GA4_SERVICE_ACCOUNT_FILE") {
            self.ga4.service_account_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("MAILCHIMP_API_KEY") {
            self.mailchimp.api_key = Some(v);
        }
        if let Some(v) = get("MAILCHIMP_SERVER_PREFIX") {
            self.mailchimp.server_prefix = Some(v);
        }
        if let Some(v) = get("MAILCHIMP_LIST_ID") {
            self.mailchimp.list_id = Some(v);
        }
        if let Some(v) = get("BEARER_TOKEN") {
            self.twitter.bearer_token = Some(v);
        }
        if let Some(v) = get("USER_ID") {
            self.twitter.user_id = Some(v);
        }
        if let Some(v) = get("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(v);
        }
        if let Some(v) = get("YOUTUBE_CHANNEL_ID") {
            self.youtube.channel_id = Some(v);
        }
        self
    }

    /// Fails with the first missing key `source` needs.
    pub fn require(&self, source: Source) -> Result<(), ConfigError> {
        let checks: Vec<(bool, &'static str, &'static str)> = match source {
            Source::Ga4 => vec![
                (self.ga4.property_id.is_some(), "ga4.property_id", "GA4_PROPERTY_ID"),
                (
                    self.ga4.service_account_file.is_some(),
                    "ga4.service_account_file",
                    "GA4_SERVICE_ACCOUNT_FILE",
                ),
            ],
            Source::Mailchimp => vec![
                (self.mailchimp.api_key.is_some(), "mailchimp.api_key", "MAILCHIMP_API_KEY"),
                (self.mailchimp.list_id.is_some(), "mailchimp.list_id", "MAILCHIMP_LIST_ID"),
            ],
            Source::Twitter => vec![
                (self.twitter.bearer_token.is_some(), "twitter.bearer_token", "BEARER_TOKEN"),
                (self.twitter.user_id.is_some(), "twitter.user_id", "USER_ID"),
            ],
            Source::Youtube => vec![
                (self.youtube.api_key.is_some(), "youtube.api_key", "YOUTUBE_API_KEY"),
                (self.youtube.channel_id.is_some(), "youtube.channel_id", "YOUTUBE_CHANNEL_ID"),
            ],
        };
        match checks.into_iter().find(|(present, _, _)| !present) {
            Some((_, key, env_var)) => Err(ConfigError::Missing { key, env_var }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_file() {
        let config = PulseConfig::from_toml_str("", Path::new("pulse.toml")).unwrap();
        assert_eq!(config.cache.ttl_seconds, 600);
        assert_eq!(config.mailchimp.server_prefix(), "us6");
    }

    #[test]
    fn environment_overrides_file() {
        let body = "[twitter]\nuser_id = \"42\"\nbearer_token = \"file\"\n";
        let config = PulseConfig::from_toml_str(body, Path::new("pulse.toml"))
            .unwrap()
            .with_env(|name| match name {
                "BEARER_TOKEN" => Some("env".to_string()),
                "USER_ID" => Some("  ".to_string()),
                _ => None,
            });
        assert_eq!(config.twitter.bearer_token.as_deref(), Some("env"));
        assert_eq!(config.twitter.user_id.as_deref(), Some("42"));
        assert!(config.require(Source::Twitter).is_ok());
    }

    #[test]
    fn require_names_first_missing_key() {
        let config = PulseConfig::default().with_env(|name| {
            (name == "MAILCHIMP_API_KEY").then(|| "key".to_string())
        });
        let err = config.require(Source::Mailchimp).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                key: "mailchimp.list_id",
                env_var: "MAILCHIMP_LIST_ID"
            }
        ));
        assert!(err.to_string().contains("MAILCHIMP_LIST_ID"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = PulseConfig::from_toml_str("[cache\nttl", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
