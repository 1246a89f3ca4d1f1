// Configuration module entry point
// Loads layered configuration and derives the middleware options from it

mod types;

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::build::command::BuildCommand;
use crate::handler::ServeOptions;

pub use types::{BuildConfig, Config, LoggingConfig, PerformanceConfig, ServeConfig, ServerConfig};

/// Default config file, looked up without extension so any supported format works
pub const DEFAULT_CONFIG_PATH: &str = "buildserve";

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; `BUILDSERVE_*` environment variables override it
    /// (e.g. `BUILDSERVE_SERVER__PORT=8080`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("BUILDSERVE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 4200)?
            .set_default("serve.output_dir", "dist")?
            .set_default("serve.auto_index", true)?
            .set_default("serve.strict_ranges", false)?
            .set_default("build.working_dir", ".")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Construction-time options for the serving middleware
    pub fn serve_options(&self) -> ServeOptions {
        ServeOptions {
            auto_index: self.serve.auto_index,
            live_reload_path: self.serve.live_reload_path.clone(),
            strict_ranges: self.serve.strict_ranges,
        }
    }

    /// Build runner settings
    pub fn build_command(&self) -> BuildCommand {
        BuildCommand {
            command: self.build.command.clone(),
            working_dir: PathBuf::from(&self.build.working_dir),
            output_dir: PathBuf::from(&self.serve.output_dir),
        }
    }
}
