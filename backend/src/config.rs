//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;

/// Which persistence backend serves users and tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Server bind address (host:port)
    pub bind_address: String,

    /// Deployment environment ("development" or "production")
    pub environment: String,

    /// Log output format: "text" or "json"
    pub log_format: String,

    /// Store backend
    pub store_backend: StoreBackend,

    /// Database connection URL (required for the postgres backend)
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    pub database_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT lifetime in hours
    pub jwt_expiration_hours: i64,

    /// Shared secret required to log in as an agent
    pub agent_access_code: Option<String>,

    /// Shared secret required to log in as an admin
    pub admin_access_code: Option<String>,

    /// Allowed browser origins in development
    pub cors_origins: Vec<String>,

    /// Login/register requests allowed per client per minute
    pub login_rate_limit: u32,

    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
}

redacted_debug!(Config {
    show bind_address,
    show environment,
    show log_format,
    show store_backend,
    redact_option database_url,
    show database_max_connections,
    redact jwt_secret,
    show jwt_expiration_hours,
    redact_option agent_access_code,
    redact_option admin_access_code,
    show cors_origins,
    show login_rate_limit,
    show bcrypt_cost,
});

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("STORE_BACKEND")
            .unwrap_or_else(|| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(AppError::Config(format!(
                    "Unknown STORE_BACKEND '{}', expected 'postgres' or 'memory'",
                    other
                )))
            }
        };

        let database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(AppError::Config("DATABASE_URL not set".into()));
        }

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Config("JWT_SECRET not set".into()))?;

        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:5000".into()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "production".into()),
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "text".into()),
            store_backend,
            database_url,
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            jwt_secret,
            jwt_expiration_hours: parse_expiration_hours(lookup("JWT_EXPIRATION_HOURS"))?,
            agent_access_code: lookup("AGENT_ACCESS_CODE").filter(|s| !s.is_empty()),
            admin_access_code: lookup("ADMIN_ACCESS_CODE").filter(|s| !s.is_empty()),
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "http://localhost:5173".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            login_rate_limit: lookup("LOGIN_RATE_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            bcrypt_cost: lookup("BCRYPT_COST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

/// Token lifetime must be positive and at most a year.
const MAX_JWT_EXPIRATION_HOURS: i64 = 24 * 365;

fn parse_expiration_hours(raw: Option<String>) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(24);
    };
    match raw.trim().parse::<i64>() {
        Ok(hours) if (1..=MAX_JWT_EXPIRATION_HOURS).contains(&hours) => Ok(hours),
        _ => Err(AppError::Config(format!(
            "JWT_EXPIRATION_HOURS must be between 1 and {}, got {:?}",
            MAX_JWT_EXPIRATION_HOURS, raw
        ))),
    }
}
