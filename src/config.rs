//! Configuration types for dvorfs-dl
//!
//! Every tunable the pipeline uses lives here and is handed to the components
//! that need it at construction time. Nothing reads ambient global state.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};

/// Main configuration for dvorfs-dl
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory that holds transient artifacts while a request is in flight
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Retry behavior of the fetcher
    #[serde(default)]
    pub retry: RetryConfig,

    /// Streaming delivery settings
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Extraction provider settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Blocking worker pool settings
    #[serde(default)]
    pub workers: WorkerConfig,

    /// API server settings
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            retry: RetryConfig::default(),
            delivery: DeliveryConfig::default(),
            extractor: ExtractorConfig::default(),
            workers: WorkerConfig::default(),
            server: ServerIntegrationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// Missing fields take their defaults. The result is validated before it is
    /// returned.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(config_error(
                "max_attempts must be at least 1",
                "retry.max_attempts",
            ));
        }
        if self.delivery.chunk_size == 0 {
            return Err(config_error(
                "chunk_size must be greater than zero",
                "delivery.chunk_size",
            ));
        }
        if self.workers.max_blocking_jobs == 0 {
            return Err(config_error(
                "max_blocking_jobs must be at least 1",
                "workers.max_blocking_jobs",
            ));
        }
        if self.extractor.allowed_extensions.is_empty() {
            return Err(config_error(
                "at least one container extension must be allowed",
                "extractor.allowed_extensions",
            ));
        }
        Ok(())
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

/// Retry configuration for the fetcher
///
/// The delay before attempt `i` (0-based, `i >= 1`) is `base_delay * 2^i`,
/// capped at `max_delay` when one is set. Attempt 0 runs immediately.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff base in milliseconds (default: 1000)
    #[serde(default = "default_base_delay", with = "duration_ms_serde")]
    pub base_delay: Duration,

    /// Upper bound for a single backoff delay in seconds (default: None = uncapped)
    #[serde(default, with = "optional_duration_serde")]
    pub max_delay: Option<Duration>,

    /// Add random jitter of up to 100% to each delay (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            max_delay: None,
            jitter: false,
        }
    }
}

/// Streaming delivery configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Size of each streamed chunk in bytes (default: 8192)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Extraction provider configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp binary (None = search PATH)
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Container extensions exposed in catalogs (default: mp4, webm, m4a)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Socket timeout passed to the provider in seconds (default: 30)
    #[serde(default = "default_socket_timeout", with = "duration_serde")]
    pub socket_timeout: Duration,

    /// Wall-clock limit for one transfer in seconds (default: 600, None = unlimited)
    #[serde(
        default = "default_transfer_timeout",
        with = "optional_duration_serde"
    )]
    pub transfer_timeout: Option<Duration>,

    /// Extra arguments appended to every provider invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            allowed_extensions: default_allowed_extensions(),
            socket_timeout: default_socket_timeout(),
            transfer_timeout: default_transfer_timeout(),
            extra_args: Vec::new(),
        }
    }
}

/// Blocking worker pool configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Maximum number of provider calls running at once (default: 4)
    #[serde(default = "default_max_blocking_jobs")]
    pub max_blocking_jobs: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_blocking_jobs: default_max_blocking_jobs(),
        }
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("dvorfs-dl")
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_chunk_size() -> usize {
    8 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["mp4".into(), "webm".into(), "m4a".into()]
}

fn default_socket_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_transfer_timeout() -> Option<Duration> {
    Some(Duration::from_secs(600))
}

fn default_max_blocking_jobs() -> usize {
    4
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
