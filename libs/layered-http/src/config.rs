use crate::decorator::{self, Decorator};
use crate::error::HttpError;
use crate::secret::SecretString;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Retry decorator configuration
///
/// `attempts` counts every call, the first one included. After failed
/// attempt `i` (from 0) the retry layer sleeps `backoff × i`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, at least 1 (default: 3)
    #[serde(default = "default_attempts")]
    pub attempts: usize,

    /// Base backoff, humantime format such as `"200ms"` (default: 100ms)
    #[serde(default = "default_backoff", deserialize_with = "humantime_duration")]
    pub backoff: Duration,
}

fn default_attempts() -> usize {
    3
}

fn default_backoff() -> Duration {
    Duration::from_millis(100)
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff: default_backoff(),
        }
    }
}

impl RetryConfig {
    /// Create retry config with explicit attempts and backoff
    #[must_use]
    pub fn new(attempts: usize, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }
}

/// One static header appended to every request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderConfig {
    /// Header name
    pub name: String,
    /// Header value
    pub value: String,
}

/// `Authorization` header source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum AuthorizationConfig {
    /// Token sent verbatim, scheme included (`Bearer abc`)
    Token(SecretString),
    /// HTTP Basic credentials
    Basic {
        /// User name (a colon here is not escaped)
        username: String,
        /// Password
        password: SecretString,
    },
}

/// Settings of the default hyper-backed root transport
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Idle timeout for pooled connections (default: 90s, `None` keeps them forever)
    #[serde(deserialize_with = "humantime_duration_opt")]
    pub pool_idle_timeout: Option<Duration>,

    /// Maximum idle connections per host (default: 32)
    pub pool_max_idle_per_host: usize,

    /// TCP connect timeout (default: none)
    #[serde(deserialize_with = "humantime_duration_opt")]
    pub connect_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            connect_timeout: None,
        }
    }
}

/// Declarative description of a composed client
///
/// ```yaml
/// transport:
///   pool_idle_timeout: 90s
/// headers:
///   - { name: x-client, value: billing }
/// authorization:
///   basic: { username: svc, password: s3cret }
/// retry:
///   attempts: 3
///   backoff: 200ms
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpClientConfig {
    /// Root transport settings (ignored when a custom root is supplied)
    pub transport: TransportConfig,

    /// Static headers, appended in listed order
    pub headers: Vec<HeaderConfig>,

    /// Optional `Authorization` header
    pub authorization: Option<AuthorizationConfig>,

    /// Optional retry policy; `None` disables retries
    pub retry: Option<RetryConfig>,
}

impl HttpClientConfig {
    /// Build the decorator list this configuration describes.
    ///
    /// Order: headers, then authorization, then retry. Retry is therefore the
    /// outermost layer and every attempt passes through the header layers.
    ///
    /// # Errors
    /// Returns an error if a header name/value is invalid or retry attempts is zero
    pub fn decorators(&self) -> Result<Vec<Decorator>, HttpError> {
        let mut decorators = Vec::with_capacity(self.headers.len() + 2);

        for h in &self.headers {
            decorators.push(decorator::header(&h.name, &h.value)?);
        }

        match &self.authorization {
            Some(AuthorizationConfig::Token(token)) => {
                decorators.push(decorator::authorization(token.expose())?);
            }
            Some(AuthorizationConfig::Basic { username, password }) => {
                decorators.push(decorator::basic_authorization(username, password.expose())?);
            }
            None => {}
        }

        if let Some(retry) = &self.retry {
            decorators.push(decorator::fault_tolerance(retry.attempts, retry.backoff)?);
        }

        Ok(decorators)
    }
}

/// Deserialize a `Duration` from a humantime string (`"250ms"`, `"1m 30s"`).
fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

fn humantime_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
        .transpose()
}
