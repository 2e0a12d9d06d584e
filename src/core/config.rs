/*!
 * Proxy Configuration
 *
 * Runtime knobs for the proxy subsystem. Defaults come from `core::limits`;
 * the service binary overrides them from `FILE_PROXY_*` environment variables.
 */

use super::errors::{ProxyError, Result};
use super::limits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming the host identity
pub const ENV_HOST: &str = "FILE_PROXY_HOST";
/// Environment variable overriding the token lifetime in seconds
pub const ENV_TTL_SECS: &str = "FILE_PROXY_TTL_SECS";
/// Environment variable forcing the sequential pipe fallback
pub const ENV_LEGACY_PIPE: &str = "FILE_PROXY_LEGACY_PIPE";
/// Environment variable overriding the sweep interval in seconds
pub const ENV_SWEEP_SECS: &str = "FILE_PROXY_SWEEP_SECS";

/// Configuration for a proxy context and its streaming server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Identity of the running application; prefix of both host authorities
    pub host_identity: String,

    /// Lifetime of each registered token (default: 5 min)
    pub ttl: Duration,

    /// Buffer used by the pipe copy task (default: 64KB)
    pub copy_buffer_size: usize,

    /// Bytes the pipe can hold before the copy task blocks
    pub pipe_capacity: usize,

    /// Whether random-access serving is available at all.
    /// When false every open takes the sequential pipe path.
    pub random_access_supported: bool,

    /// Name of the dedicated worker thread
    pub worker_name: String,

    /// Interval of the optional expiry sweep
    pub sweep_interval: Duration,
}

impl ProxyConfig {
    /// Create default configuration for the given host identity
    pub fn new(host_identity: impl Into<String>) -> Self {
        Self {
            host_identity: host_identity.into(),
            ttl: limits::TOKEN_TTL,
            copy_buffer_size: limits::COPY_BUFFER_SIZE,
            pipe_capacity: limits::PIPE_CAPACITY,
            random_access_supported: true,
            worker_name: limits::DEFAULT_WORKER_NAME.to_string(),
            sweep_interval: limits::DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_HOST).unwrap_or_else(|| limits::DEFAULT_HOST_IDENTITY.to_string());
        let mut config = Self::new(host);

        if let Some(raw) = lookup(ENV_TTL_SECS) {
            config.ttl = Duration::from_secs(parse_secs(ENV_TTL_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_SWEEP_SECS) {
            config.sweep_interval = Duration::from_secs(parse_secs(ENV_SWEEP_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_LEGACY_PIPE) {
            config.random_access_supported = !parse_flag(ENV_LEGACY_PIPE, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_copy_buffer_size(mut self, size: usize) -> Self {
        self.copy_buffer_size = size;
        self
    }

    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity;
        self
    }

    pub fn with_random_access(mut self, supported: bool) -> Self {
        self.random_access_supported = supported;
        self
    }

    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.host_identity.trim().is_empty() {
            return Err(ProxyError::Configuration(
                "host identity must not be empty".to_string(),
            ));
        }
        if !is_authority_safe(&self.host_identity) {
            return Err(ProxyError::Configuration(format!(
                "host identity {:?} may only contain ASCII letters, digits, '.', '-' and '_'",
                self.host_identity
            )));
        }
        if self.ttl.is_zero() || self.ttl > limits::MAX_TOKEN_TTL {
            return Err(ProxyError::Configuration(format!(
                "ttl must be between 1s and {}s",
                limits::MAX_TOKEN_TTL.as_secs()
            )));
        }
        if self.copy_buffer_size == 0 || self.pipe_capacity == 0 {
            return Err(ProxyError::Configuration(
                "copy buffer and pipe capacity must be positive".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() || self.sweep_interval > limits::MAX_SWEEP_INTERVAL {
            return Err(ProxyError::Configuration(format!(
                "sweep interval must be between 1s and {}s",
                limits::MAX_SWEEP_INTERVAL.as_secs()
            )));
        }
        Ok(())
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::new(limits::DEFAULT_HOST_IDENTITY)
    }
}

/// Host identities become URI authorities verbatim
fn is_authority_safe(identity: &str) -> bool {
    identity
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ProxyError::Configuration(format!("{key}={raw:?}: {e}")))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ProxyError::Configuration(format!(
            "{key}={other:?}: expected a boolean"
        ))),
    }
}
