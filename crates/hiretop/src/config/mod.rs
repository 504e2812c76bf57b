use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::applications::TransitionPolicy;

const DEVELOPMENT_SIGNING_SECRET: &str = "hiretop-development-signing-secret";

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
    pub hiring: HiringConfig,
    pub documents: DocumentConfig,
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

        let transitions = match env::var("HIRETOP_STATUS_TRANSITIONS") {
            Ok(raw) => TransitionPolicy::parse(&raw)
                .ok_or(ConfigError::InvalidTransitionPolicy { value: raw })?,
            Err(_) => TransitionPolicy::default(),
        };

        let hiring = HiringConfig {
            profile_completion_floor: numeric_var("HIRETOP_PROFILE_COMPLETION_FLOOR", 25)?,
            offer_lifetime_months: numeric_var("HIRETOP_OFFER_LIFETIME_MONTHS", 1)?,
            transitions,
            page_size: numeric_var("HIRETOP_PAGE_SIZE", 20)?,
            offer_page_size: numeric_var("HIRETOP_OFFER_PAGE_SIZE", 12)?,
        };

        let signing_secret = match env::var("HIRETOP_SIGNING_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingSigningSecret)
            }
            _ => DEVELOPMENT_SIGNING_SECRET.to_string(),
        };

        let documents = DocumentConfig {
            root: PathBuf::from(
                env::var("HIRETOP_DOCUMENT_ROOT").unwrap_or_else(|_| "./data/uploads".to_string()),
            ),
            url_prefix: env::var("HIRETOP_DOCUMENT_URL_PREFIX")
                .unwrap_or_else(|_| "/files".to_string()),
            signing_secret,
            signed_url_ttl: Duration::from_secs(
                numeric_var::<u64>("HIRETOP_SIGNED_URL_TTL_MINUTES", 15)? * 60,
            ),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            hiring,
            documents,
        })
    }
}

fn numeric_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
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

/// Business policy knobs shared by the hiring services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiringConfig {
    /// Talents scoring at or below this value are sent back to their profile page.
    pub profile_completion_floor: u8,
    pub offer_lifetime_months: u32,
    pub transitions: TransitionPolicy,
    pub page_size: u32,
    pub offer_page_size: u32,
}

impl Default for HiringConfig {
    fn default() -> Self {
        Self {
            profile_completion_floor: 25,
            offer_lifetime_months: 1,
            transitions: TransitionPolicy::default(),
            page_size: 20,
            offer_page_size: 12,
        }
    }
}

/// Where uploaded documents live and how download links are signed.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub root: PathBuf,
    pub url_prefix: String,
    pub signing_secret: String,
    pub signed_url_ttl: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidTransitionPolicy { value: String },
    MissingSigningSecret,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
            ConfigError::InvalidTransitionPolicy { value } => write!(
                f,
                "HIRETOP_STATUS_TRANSITIONS must be `permissive` or `strict`, got `{value}`"
            ),
            ConfigError::MissingSigningSecret => {
                write!(f, "HIRETOP_SIGNING_SECRET is required in production")
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
            | ConfigError::InvalidTransitionPolicy { .. }
            | ConfigError::MissingSigningSecret => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "HIRETOP_PROFILE_COMPLETION_FLOOR",
            "HIRETOP_OFFER_LIFETIME_MONTHS",
            "HIRETOP_STATUS_TRANSITIONS",
            "HIRETOP_DOCUMENT_ROOT",
            "HIRETOP_DOCUMENT_URL_PREFIX",
            "HIRETOP_SIGNING_SECRET",
            "HIRETOP_SIGNED_URL_TTL_MINUTES",
            "HIRETOP_PAGE_SIZE",
            "HIRETOP_OFFER_PAGE_SIZE",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.hiring, HiringConfig::default());
        assert_eq!(config.documents.url_prefix, "/files");
        assert_eq!(config.documents.signed_url_ttl, Duration::from_secs(900));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn strict_transitions_can_be_selected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("HIRETOP_STATUS_TRANSITIONS", "Strict");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.hiring.transitions, TransitionPolicy::Strict);

        env::set_var("HIRETOP_STATUS_TRANSITIONS", "anything");
        match AppConfig::load() {
            Err(ConfigError::InvalidTransitionPolicy { value }) => assert_eq!(value, "anything"),
            other => panic!("expected invalid transition policy, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_floor() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("HIRETOP_PROFILE_COMPLETION_FLOOR", "low");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { key }) => {
                assert_eq!(key, "HIRETOP_PROFILE_COMPLETION_FLOOR")
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn production_requires_signing_secret() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::MissingSigningSecret)
        ));

        env::set_var("HIRETOP_SIGNING_SECRET", "s3cret");
        let config = AppConfig::load().expect("config loads with secret");
        assert_eq!(config.documents.signing_secret, "s3cret");
        reset_env();
    }
}
