// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub routes: RoutesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Which object store implementation backs the gateway
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    /// S3-compatible service (AWS S3, `MinIO`, ...)
    #[default]
    S3,
    /// Process-local store, optionally seeded from disk
    Memory,
}

/// Object store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Custom endpoint, e.g. `http://minio:9000`
    #[serde(default)]
    pub endpoint: Option<String>,
    pub region: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Allow plain HTTP to the endpoint
    pub allow_http: bool,
    pub music_bucket: String,
    pub image_bucket: String,
    /// Memory backend only: upload `<seed_dir>/<bucket>/*` at startup
    #[serde(default)]
    pub seed_dir: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::S3,
            endpoint: None,
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            allow_http: true,
            music_bucket: "music".to_string(),
            image_bucket: "images".to_string(),
            seed_dir: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Reuse connections for further requests; when off, each connection
    /// closes after one response
    pub keep_alive: bool,
    /// Seconds allowed for a client to send its request headers
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight connections on shutdown
    pub shutdown_timeout: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
}

/// Routes configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// Prefix of the media endpoints, e.g. `/api`
    pub api_prefix: String,
    /// Prefix used in listing URLs when the gateway sits behind a proxy path
    #[serde(default)]
    pub public_url_prefix: Option<String>,
    pub health_path: String,
}

impl RoutesConfig {
    /// Prefix that clients should use to reach the media endpoints
    pub fn public_prefix(&self) -> &str {
        self.public_url_prefix
            .as_deref()
            .unwrap_or(&self.api_prefix)
            .trim_end_matches('/')
    }
}
