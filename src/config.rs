use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SEARCH_API_URL: &str = "https://www.searchapi.io/api/v1/search";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// API credential that never shows up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Daily rolling log files are written here when set
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: Secret,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Secret,
    pub base_url: String,
    pub model: String,
    pub transcription_model: String,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Web search is skipped by the novelty evaluator when no key is configured
    pub api_key: Option<Secret>,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct Limits {
    pub upstream_timeout: Duration,
    pub evaluator_timeout: Duration,
    pub max_upload_bytes: usize,
    pub novelty_results: u8,
    pub max_excerpt_files: usize,
}

/// Process-wide configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub github: GitHubConfig,
    pub openai: OpenAiConfig,
    pub search: SearchConfig,
    pub limits: Limits,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let github = GitHubConfig {
            token: Secret::new(required("GITHUB_TOKEN")?),
            api_url: trim_url(get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_GITHUB_API_URL.into())),
        };

        let openai = OpenAiConfig {
            api_key: Secret::new(required("OPENAI_API_KEY")?),
            base_url: trim_url(get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into())),
            model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".into()),
            transcription_model: get("OPENAI_TRANSCRIPTION_MODEL").unwrap_or_else(|| "whisper-1".into()),
        };

        let search = SearchConfig {
            api_key: get("SEARCH_API_KEY").map(Secret::new),
            api_url: get("SEARCH_API_URL").unwrap_or_else(|| DEFAULT_SEARCH_API_URL.into()),
        };

        let limits = Limits {
            upstream_timeout: Duration::from_secs(parse_or(&get, "UPSTREAM_TIMEOUT_SECS", 60u64)?),
            evaluator_timeout: Duration::from_secs(parse_or(&get, "EVALUATOR_TIMEOUT_SECS", 180u64)?),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", 100 * 1024 * 1024usize)?,
            novelty_results: parse_or(&get, "NOVELTY_RESULTS", 5u8)?,
            max_excerpt_files: parse_or(&get, "MAX_EXCERPT_FILES", 12usize)?,
        };

        let logging = LoggingConfig {
            format: match get("LOG_FORMAT").as_deref() {
                None | Some("pretty") => LogFormat::Pretty,
                Some("json") => LogFormat::Json,
                Some(other) => {
                    return Err(ConfigError::Invalid {
                        key: "LOG_FORMAT",
                        reason: format!("expected 'pretty' or 'json', got '{}'", other),
                    })
                }
            },
            dir: get("LOG_DIR").map(PathBuf::from),
        };

        Ok(Self {
            bind_addr: parse_or(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000)))?,
            github,
            openai,
            search,
            limits,
            logging,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_loads_defaults_with_required_credentials() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "ghp_test"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(config.github.token.expose(), "ghp_test");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(config.search.api_key.is_none());
        assert_eq!(config.limits.upstream_timeout, Duration::from_secs(60));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_github_token_is_fatal() {
        let err = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GITHUB_TOKEN")));
    }

    #[test]
    fn test_blank_openai_key_counts_as_missing() {
        let err = AppConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "ghp_test"),
            ("OPENAI_API_KEY", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));
    }

    #[test]
    fn test_invalid_numeric_value() {
        let err = AppConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "ghp_test"),
            ("OPENAI_API_KEY", "sk-test"),
            ("UPSTREAM_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "UPSTREAM_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "ghp_test"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1/"),
            ("SEARCH_API_KEY", "serp"),
            ("LOG_FORMAT", "json"),
            ("BIND_ADDR", "127.0.0.1:3000"),
        ]))
        .unwrap();

        assert_eq!(config.openai.base_url, "http://localhost:9000/v1");
        assert_eq!(config.search.api_key.as_ref().map(Secret::expose), Some("serp"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("sk-very-secret");
        assert_eq!(format!("{:?}", secret), "Secret(***)");
    }
}
