/// Configuration management for Kinship Records
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub emergency: EmergencyConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Externally reachable base URL, used to build emergency access links
    pub public_url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 key used to verify bearer tokens
    pub jwt_secret: String,
}

/// Emergency access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyConfig {
    /// Seconds between sweeps of expired access tokens
    pub cleanup_interval_secs: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub public_rps: u32,
    pub authenticated_rps: u32,
    pub burst_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("KINSHIP_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port: u16 = env_setting("KINSHIP_PORT", 8080)?;
        let public_url = env::var("KINSHIP_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));

        let data_directory: PathBuf = env::var("KINSHIP_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("KINSHIP_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("kinship.sqlite"));

        let jwt_secret = env::var("KINSHIP_JWT_SECRET")
            .map_err(|_| ApiError::Validation("JWT secret required".to_string()))?;

        let cleanup_interval_secs = env_setting("KINSHIP_TOKEN_CLEANUP_INTERVAL", 3600)?;

        let rate_limit_enabled = env_flag("KINSHIP_RATE_LIMITS_ENABLED", true)?;
        let public_rps = env_setting("KINSHIP_RATE_LIMIT_PUBLIC_RPS", 5)?;
        let authenticated_rps = env_setting("KINSHIP_RATE_LIMIT_AUTHENTICATED_RPS", 50)?;
        let burst_size = env_setting("KINSHIP_RATE_LIMIT_BURST", 25)?;

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_json = env_flag("KINSHIP_LOG_JSON", false)?;

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url: public_url.trim_end_matches('/').to_string(),
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            authentication: AuthConfig { jwt_secret },
            emergency: EmergencyConfig {
                cleanup_interval_secs,
            },
            rate_limit: RateLimitConfig {
                enabled: rate_limit_enabled,
                public_rps,
                authenticated_rps,
                burst_size,
            },
            logging: LoggingConfig {
                level: log_level,
                json: log_json,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if !(self.service.public_url.starts_with("http://")
            || self.service.public_url.starts_with("https://"))
        {
            return Err(ApiError::Validation(
                "Public URL must start with http:// or https://".to_string(),
            ));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(ApiError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.emergency.cleanup_interval_secs == 0 {
            return Err(ApiError::Validation(
                "Token cleanup interval must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Read a typed setting from the environment, using `default` only when unset
fn env_setting<T: FromStr>(name: &str, default: T) -> ApiResult<T> {
    parse_setting(name, env::var(name).ok(), default)
}

/// Read a boolean flag from the environment, using `default` only when unset
fn env_flag(name: &str, default: bool) -> ApiResult<bool> {
    parse_flag(name, env::var(name).ok(), default)
}

fn parse_setting<T: FromStr>(name: &str, raw: Option<String>, default: T) -> ApiResult<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ApiError::Validation(format!("Invalid value for {}: {:?}", name, value))),
    }
}

fn parse_flag(name: &str, raw: Option<String>, default: bool) -> ApiResult<bool> {
    let Some(value) = raw else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApiError::Validation(format!(
            "Invalid boolean for {}: {:?}",
            name, value
        ))),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "localhost".to_string(),
            port: 8080,
            public_url: "https://health.example.org".to_string(),
        },
        storage: StorageConfig {
            data_directory: PathBuf::from("./data"),
            database: PathBuf::from(":memory:"),
        },
        authentication: AuthConfig {
            jwt_secret: "test-secret-key-for-testing-only".to_string(),
        },
        emergency: EmergencyConfig {
            cleanup_interval_secs: 3600,
        },
        rate_limit: RateLimitConfig {
            enabled: false,
            public_rps: 5,
            authenticated_rps: 50,
            burst_size: 25,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            json: false,
        },
    }
}
