// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub serve: ServeConfig,
    pub build: BuildConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Build output serving configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServeConfig {
    /// Build output directory, relative to `build.working_dir`
    pub output_dir: String,
    /// Generate listings for directories without `index.html`
    pub auto_index: bool,
    /// Live-reload script URL injected into generated pages
    #[serde(default)]
    pub live_reload_path: Option<String>,
    /// Validate ranges (416) and send the slice length as `Content-Length`
    #[serde(default)]
    pub strict_ranges: bool,
}

/// Build pipeline configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BuildConfig {
    /// Shell command producing `serve.output_dir`; none means serve as-is
    #[serde(default)]
    pub command: Option<String>,
    pub working_dir: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Connection handling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds allowed to receive a request's headers (0 disables); the
    /// build wait and the response body are not limited
    pub header_read_timeout: u64,
}
