//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Validation is a pure function
//! returning every violation, not just the first one.

use std::fmt;

use crate::config::schema::{Environment, ServiceConfig};

/// A single semantic violation in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service_name.trim().is_empty() {
        errors.push(ValidationError::new("service_name", "must not be empty"));
    }

    let server = &config.server;
    if server.port == server.metrics_port {
        errors.push(ValidationError::new(
            "server.metrics_port",
            format!("must differ from server.port ({})", server.port),
        ));
    }
    if server.grace_period_ms == 0 {
        errors.push(ValidationError::new("server.grace_period_ms", "must be greater than 0"));
    }
    if server.hard_deadline_ms <= server.grace_period_ms {
        errors.push(ValidationError::new(
            "server.hard_deadline_ms",
            format!("must be greater than server.grace_period_ms ({})", server.grace_period_ms),
        ));
    }

    let buckets = &config.metrics.buckets;
    if buckets.is_empty() {
        errors.push(ValidationError::new("metrics.buckets", "must not be empty"));
    } else if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
        errors.push(ValidationError::new("metrics.buckets", "must be strictly increasing"));
    }

    if config.environment == Environment::Prod && config.jwt.secret.is_empty() {
        errors.push(ValidationError::new("jwt.secret", "must be set in prod"));
    }
    if config.jwt.auth_token_ttl_secs == 0 {
        errors.push(ValidationError::new("jwt.auth_token_ttl_secs", "must be greater than 0"));
    }

    if !is_identifier(&config.database.users_table) {
        errors.push(ValidationError::new(
            "database.users_table",
            format!("'{}' is not a valid table name", config.database.users_table),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// SQL identifier check: letter or underscore followed by letters, digits or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
