// Configuration module entry point
// Loads, validates and exposes the process-wide configuration

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, RoutesConfig, StorageBackendKind, StorageConfig};

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; `MEDIA_*` environment variables override it,
    /// using `__` between nested keys (e.g. `MEDIA_STORAGE__ENDPOINT`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIA")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8022)?
            .set_default("storage.backend", "s3")?
            .set_default("storage.region", "us-east-1")?
            .set_default("storage.allow_http", true)?
            .set_default("storage.music_bucket", "music")?
            .set_default("storage.image_bucket", "images")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .set_default("http.server_name", "media-gateway")?
            .set_default("http.enable_cors", true)?
            .set_default("routes.api_prefix", "/api")?
            .set_default("routes.health_path", "/health")?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate().map_err(config::ConfigError::Message)?;
        Ok(config)
    }

    /// Reject settings that would leave the gateway unable to serve
    pub fn validate(&self) -> Result<(), String> {
        if self.storage.music_bucket.trim().is_empty() {
            return Err("storage.music_bucket must not be empty".to_string());
        }
        if self.storage.image_bucket.trim().is_empty() {
            return Err("storage.image_bucket must not be empty".to_string());
        }
        if !self.routes.api_prefix.starts_with('/') {
            return Err(format!(
                "routes.api_prefix must start with '/': {}",
                self.routes.api_prefix
            ));
        }
        if self.storage.seed_dir.is_some() && self.storage.backend != StorageBackendKind::Memory {
            return Err("storage.seed_dir is only supported with the memory backend".to_string());
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    use types::{HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: None,
        },
        storage: StorageConfig {
            backend: StorageBackendKind::Memory,
            ..StorageConfig::default()
        },
        logging: LoggingConfig {
            level: "error".to_string(),
            access_log: false,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        },
        performance: PerformanceConfig {
            keep_alive: true,
            read_timeout: 30,
            max_connections: None,
            shutdown_timeout: 1,
        },
        http: HttpConfig {
            server_name: "media-gateway".to_string(),
            enable_cors: true,
        },
        routes: RoutesConfig {
            api_prefix: "/api".to_string(),
            public_url_prefix: None,
            health_path: "/health".to_string(),
        },
    }
}
