//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `HOSTEL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **Defaults** - see the `Default` implementations below
//! 2. **YAML config file** - Base configuration (default: `config.yaml`)
//! 3. **Environment variables** - Variables prefixed with `HOSTEL_` override YAML values
//! 4. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `HOSTEL_AUTH__SESSION__COOKIE_SECURE=true` sets the `auth.session.cookie_secure` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use hostelctl::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! HOSTEL_PORT=8080
//!
//! # Point at a different database file
//! DATABASE_URL="sqlite:///var/lib/hostel/hostel.db?mode=rwc"
//!
//! # Seed an administrator on first startup
//! HOSTEL_ADMIN_USERNAME=warden
//! HOSTEL_ADMIN_PASSWORD=change-me-please
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "HOSTEL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the conventional `DATABASE_URL` variable; folded into `database.url` on load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// SQLite database settings
    pub database: DatabaseConfig,
    /// Username for the initial administrator (created on startup if missing)
    pub admin_username: Option<String>,
    /// Password for the initial administrator
    pub admin_password: Option<String>,
    /// Login and session configuration
    pub auth: AuthConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5500,
            database_url: None,
            database: DatabaseConfig::default(),
            admin_username: None,
            admin_password: None,
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLx connection string, e.g. `sqlite://hostel.db?mode=rwc` or `sqlite::memory:`
    pub url: String,
    /// Connection pool settings
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://hostel.db?mode=rwc".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Connection pool parameters passed through to `SqlitePoolOptions`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
    /// Time before idle connections are closed (None = never)
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime of a connection (None = never)
    #[serde(with = "humantime_serde")]
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Accept stored passwords that are not hashes, upgrading them on the next successful login.
    ///
    /// Turn this off once every account has logged in at least once.
    pub allow_legacy_plaintext: bool,
    /// Session cookie configuration
    pub session: SessionConfig,
    /// Password validation rules
    pub password: PasswordConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_legacy_plaintext: true,
            session: SessionConfig::default(),
            password: PasswordConfig::default(),
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Session timeout duration
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Cookie name for session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(24 * 60 * 60),
            cookie_name: "hostel_session".to_string(),
            cookie_secure: false,
            cookie_same_site: "lax".to_string(),
        }
    }
}

/// Password validation rules, applied to credentials this service creates.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests. Empty means same-origin only.
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://hostel.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |message: String| Error::Internal {
            operation: format!("Config validation: {message}"),
        };

        if self.database.url.trim().is_empty() {
            return Err(invalid("database.url cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(invalid("port must be non-zero".to_string()));
        }

        let pool = &self.database.pool;
        if pool.max_connections == 0 {
            return Err(invalid("database.pool.max_connections must be at least 1".to_string()));
        }
        if pool.min_connections > pool.max_connections {
            return Err(invalid(format!(
                "database.pool.min_connections ({}) cannot be greater than max_connections ({})",
                pool.min_connections, pool.max_connections
            )));
        }

        let session = &self.auth.session;
        if session.timeout.is_zero() {
            return Err(invalid("auth.session.timeout must be greater than zero".to_string()));
        }
        if session.cookie_name.trim().is_empty() {
            return Err(invalid("auth.session.cookie_name cannot be empty".to_string()));
        }
        match session.cookie_same_site.to_ascii_lowercase().as_str() {
            "strict" | "lax" => {}
            "none" if session.cookie_secure => {}
            "none" => {
                return Err(invalid(
                    "auth.session.cookie_same_site=none requires cookie_secure=true".to_string(),
                ));
            }
            other => {
                return Err(invalid(format!(
                    "auth.session.cookie_same_site must be one of strict, lax or none (got '{other}')"
                )));
            }
        }

        let password = &self.auth.password;
        if password.min_length < 1 {
            return Err(invalid("auth.password.min_length must be at least 1".to_string()));
        }
        if password.min_length > password.max_length {
            return Err(invalid(format!(
                "auth.password.min_length ({}) cannot be greater than max_length ({})",
                password.min_length, password.max_length
            )));
        }

        match (&self.admin_username, &self.admin_password) {
            (Some(_), None) => {
                return Err(invalid("admin_username is set but admin_password is missing".to_string()));
            }
            (None, Some(_)) => {
                return Err(invalid("admin_password is set but admin_username is missing".to_string()));
            }
            (Some(username), Some(admin_password)) => {
                if username.trim().is_empty() {
                    return Err(invalid("admin_username cannot be empty".to_string()));
                }
                let len = admin_password.chars().count();
                if len < password.min_length || len > password.max_length {
                    return Err(invalid(format!(
                        "admin_password must be between {} and {} characters",
                        password.min_length, password.max_length
                    )));
                }
            }
            (None, None) => {}
        }

        let has_wildcard = self.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.cors.allow_credentials {
            return Err(invalid(
                "CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins.".to_string(),
            ));
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("HOSTEL_").ignore(&["CONFIG"]).split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
