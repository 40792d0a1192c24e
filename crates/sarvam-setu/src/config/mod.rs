use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::questionnaire::MatcherConfig;

const DEFAULT_RESULT_LIMIT: usize = 10;
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

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
    pub eligibility: EligibilityConfig,
    pub sessions: SessionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let result_limit = read_number("ELIGIBILITY_RESULT_LIMIT", DEFAULT_RESULT_LIMIT as u64)?;
        let result_limit =
            usize::try_from(result_limit).map_err(|_| ConfigError::InvalidNumber {
                key: "ELIGIBILITY_RESULT_LIMIT",
            })?;
        let query_timeout_ms =
            read_number("ELIGIBILITY_QUERY_TIMEOUT_MS", DEFAULT_QUERY_TIMEOUT_MS)?;
        let session_ttl_secs = read_number("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;

        let rules_path = env::var("RULES_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            eligibility: EligibilityConfig {
                result_limit,
                query_timeout: Duration::from_millis(query_timeout_ms),
                rules_path,
            },
            sessions: SessionConfig {
                idle_ttl: Duration::from_secs(session_ttl_secs),
            },
        })
    }
}

/// Read a strictly positive number, falling back to `default` when `key` is unset.
fn read_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidNumber { key }),
        Ok(value) => Ok(value),
    }
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Rule lookup settings shared by the matcher and the rule catalog loader.
#[derive(Debug, Clone)]
pub struct EligibilityConfig {
    pub result_limit: usize,
    pub query_timeout: Duration,
    pub rules_path: Option<PathBuf>,
}

impl EligibilityConfig {
    pub fn matcher(&self) -> MatcherConfig {
        MatcherConfig {
            result_limit: self.result_limit,
            query_timeout: self.query_timeout,
        }
    }
}

/// Idle sessions older than `idle_ttl` are evicted by the sweeper.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub idle_ttl: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive whole number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
