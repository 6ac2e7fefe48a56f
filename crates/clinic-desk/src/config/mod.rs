use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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

/// Top-level configuration for the clinic desk service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub reminders: ReminderConfig,
}

impl AppConfig {
    /// Read `.env` (when present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|variable| env::var(variable).ok())
    }

    /// Build the configuration from any variable source. Unset and blank values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |variable: &str| lookup(variable).filter(|value| !value.trim().is_empty());

        let environment = read("APP_ENV")
            .map(|value| AppEnvironment::from_str(&value))
            .unwrap_or(AppEnvironment::Development);

        let server = ServerConfig {
            host: read("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: match read("APP_PORT") {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort)?,
                None => 3000,
            },
        };

        let telemetry = TelemetryConfig {
            log_level: read("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        let defaults = ReminderConfig::default();
        let poll_secs = number(&read, "APP_REMINDER_POLL_SECS")?
            .unwrap_or(defaults.poll_interval.as_secs());
        if poll_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        let reminders = ReminderConfig {
            poll_interval: Duration::from_secs(poll_secs),
            dedup_window: number(&read, "APP_NOTIFICATION_DEDUP_MINUTES")?
                .map_or(defaults.dedup_window, minutes),
            marker_retention: number(&read, "APP_MARKER_RETENTION_DAYS")?
                .map_or(defaults.marker_retention, days),
            marker_path: read("APP_MARKER_PATH").map(PathBuf::from),
        };

        Ok(Self {
            environment,
            server,
            telemetry,
            reminders,
        })
    }
}

fn number<F>(read: &F, variable: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    read(variable)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { variable })
        })
        .transpose()
}

fn minutes(value: u64) -> chrono::Duration {
    chrono::Duration::minutes(i64::try_from(value).unwrap_or(i64::MAX / 60_000))
}

fn days(value: u64) -> chrono::Duration {
    chrono::Duration::days(i64::try_from(value).unwrap_or(i64::MAX / 86_400_000))
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

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Reminder poll cadence and notification dedup settings.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub poll_interval: Duration,
    pub dedup_window: chrono::Duration,
    /// Local "last shown" markers older than this are pruned at start-up.
    pub marker_retention: chrono::Duration,
    /// File backing the per-device markers; kept in memory when unset.
    pub marker_path: Option<PathBuf>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            dedup_window: chrono::Duration::minutes(30),
            marker_retention: chrono::Duration::days(7),
            marker_path: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
    ZeroPollInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must be 'localhost' or an IPv4/IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
            ConfigError::ZeroPollInterval => {
                write!(f, "APP_REMINDER_POLL_SECS must be greater than zero")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::ZeroPollInterval => None,
        }
    }
}
