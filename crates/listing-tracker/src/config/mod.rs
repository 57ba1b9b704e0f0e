use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::tracker::heading_text;

pub const DEFAULT_TRACKER_PATH: &str = "docs/API_INTEGRATION_STATUS.md";
pub const DEFAULT_TRACKER_TITLE: &str = "API Integration Status";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub tracker: TrackerConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let telemetry = TelemetryConfig {
            log_level: var_or("APP_LOG_LEVEL", "info"),
            ansi: environment == AppEnvironment::Development,
        };

        let path = PathBuf::from(var_or("TRACKER_PATH", DEFAULT_TRACKER_PATH));
        check_tracker_path(&path)?;
        let title = var_or("TRACKER_TITLE", DEFAULT_TRACKER_TITLE);
        let title = heading_text("title", &title)
            .map_err(|_| ConfigError::InvalidTrackerTitle { value: title })?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry,
            tracker: TrackerConfig { path, title },
        })
    }
}

/// Tracker documents are markdown; anything else is refused before it is read or written.
pub fn check_tracker_path(path: &Path) -> Result<(), ConfigError> {
    if path.extension().map_or(true, |ext| ext != "md") {
        return Err(ConfigError::InvalidTrackerPath {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Blank values count as unset.
fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Log filter plus whether to colour output (development only).
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Location and heading of the markdown tracker document.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub path: PathBuf,
    pub title: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTrackerPath { path: PathBuf },
    InvalidTrackerTitle { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTrackerPath { path } => {
                write!(f, "tracker path must name a .md file, got '{}'", path.display())
            }
            ConfigError::InvalidTrackerTitle { value } => {
                write!(f, "TRACKER_TITLE '{value}' cannot be used as a markdown heading")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidTrackerPath { .. }
            | ConfigError::InvalidTrackerTitle { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
