//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name, used as the `service` metric label.
    pub service_name: String,

    /// Logging profile.
    pub environment: Environment,

    /// Listener and shutdown settings.
    pub server: ServerConfig,

    /// Request metrics settings.
    pub metrics: MetricsConfig,

    /// CORS settings.
    pub cors: CorsConfig,

    /// Token signing settings.
    pub jwt: JwtConfig,

    /// User database settings.
    pub database: DatabaseConfig,

    /// Transactional mail settings.
    pub mailgun: MailgunConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: "rest-service".to_string(),
            environment: Environment::default(),
            server: ServerConfig::default(),
            metrics: MetricsConfig::default(),
            cors: CorsConfig::default(),
            jwt: JwtConfig::default(),
            database: DatabaseConfig::default(),
            mailgun: MailgunConfig::default(),
        }
    }
}

/// Logging verbosity profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Human readable output, debug and above.
    #[default]
    Dev,
    /// JSON output, warnings and above.
    Prod,
}

/// Returned when an environment name is neither `dev` nor `prod`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment: '{0}'")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev => f.write_str("dev"),
            Self::Prod => f.write_str("prod"),
        }
    }
}

/// Listener configuration for the application and metrics servers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface both listeners bind to.
    pub host: String,

    /// Application traffic port.
    pub port: u16,

    /// Metrics scrape port.
    pub metrics_port: u16,

    /// Time given to drainable work and open connections to finish, in milliseconds.
    pub grace_period_ms: u64,

    /// Absolute limit for connection shutdown, in milliseconds.
    pub hard_deadline_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            metrics_port: 3001,
            grace_period_ms: 20_000,
            hard_deadline_ms: 21_000,
        }
    }
}

impl ServerConfig {
    /// Bind address of the application listener.
    pub fn app_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Bind address of the metrics listener.
    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.host, self.metrics_port)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn hard_deadline(&self) -> Duration {
        Duration::from_millis(self.hard_deadline_ms)
    }
}

/// Request metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Histogram bucket boundaries for request durations, in seconds.
    pub buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            buckets: vec![0.1, 0.2, 0.5],
        }
    }
}

/// CORS configuration. An empty origin list disables the CORS layer.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins, `*` for any.
    pub allowed_origins: Vec<String>,
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HMAC secret for HS256.
    pub secret: String,

    /// Lifetime of access tokens in seconds.
    pub auth_token_ttl_secs: u64,

    /// Lifetime of refresh tokens in seconds.
    pub refresh_token_ttl_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            auth_token_ttl_secs: 15 * 60,
            refresh_token_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl JwtConfig {
    pub fn auth_token_ttl(&self) -> Duration {
        Duration::from_secs(self.auth_token_ttl_secs)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }
}

/// User database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database hostname. Empty keeps users in memory.
    pub host: String,
    pub username: String,
    pub password: String,
    pub name: String,

    /// Table holding user accounts.
    pub users_table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: "postgres".to_string(),
            password: String::new(),
            name: "postgres".to_string(),
            users_table: "users".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Whether a database host was configured.
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }
}

/// Mailgun configuration. The mail route is only mounted when a domain and key are set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailgunConfig {
    pub domain: String,
    pub api_key: String,

    /// Address receiving contact form messages.
    pub recipient: String,

    /// API root, e.g. `https://api.mailgun.net/v3`.
    pub base_url: String,
}

impl Default for MailgunConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            api_key: String::new(),
            recipient: String::new(),
            base_url: "https://api.mailgun.net/v3".to_string(),
        }
    }
}

impl MailgunConfig {
    pub fn is_configured(&self) -> bool {
        !self.domain.is_empty() && !self.api_key.is_empty()
    }
}
