use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::verification::Grade;

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
    pub compliance: ComplianceConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            compliance: ComplianceConfig::from_env()?,
        })
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Scheduling windows and the stand-in verification client identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceConfig {
    /// Days before a requirement's due date at which a reminder becomes due.
    pub reminder_days: i64,
    /// Days before a verification expires at which it is flagged for refresh.
    pub refresh_days: i64,
    pub stub_domain: String,
    pub stub_grade: Grade,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            reminder_days: 7,
            refresh_days: 7,
            stub_domain: "supplier.example".to_string(),
            stub_grade: Grade::B,
        }
    }
}

impl ComplianceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let reminder_days = parse_days("COMPLIANCE_REMINDER_DAYS", defaults.reminder_days)?;
        let refresh_days = parse_days("COMPLIANCE_REFRESH_DAYS", defaults.refresh_days)?;
        let stub_domain = env::var("COMPLIANCE_STUB_DOMAIN")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.stub_domain);
        let stub_grade = match env::var("COMPLIANCE_STUB_GRADE") {
            Ok(raw) => raw
                .parse::<Grade>()
                .map_err(|_| ConfigError::InvalidGrade { value: raw })?,
            Err(_) => defaults.stub_grade,
        };

        Ok(Self {
            reminder_days,
            refresh_days,
            stub_domain,
            stub_grade,
        })
    }
}

fn parse_days(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|days| *days >= 0)
            .ok_or(ConfigError::InvalidDays { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDays { key: &'static str },
    InvalidGrade { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDays { key } => {
                write!(f, "{key} must be a non-negative number of days")
            }
            ConfigError::InvalidGrade { value } => {
                write!(f, "COMPLIANCE_STUB_GRADE '{value}' is not one of A, B, C, D, F")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidDays { .. }
            | ConfigError::InvalidGrade { .. } => None,
        }
    }
}
