//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Environment, ServiceConfig, UnknownEnvironment};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidVar { key: &'static str, value: String },

    #[error(transparent)]
    Environment(#[from] UnknownEnvironment),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Override well-known keys from a variable lookup (usually the process environment).
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let string = |key: &str, target: &mut String| {
        if let Some(value) = lookup(key) {
            *target = value;
        }
    };

    string("SERVICE_NAME", &mut config.service_name);
    string("JWT_SECRET", &mut config.jwt.secret);
    string("DB_HOST", &mut config.database.host);
    string("DB_USER", &mut config.database.username);
    string("DB_PASS", &mut config.database.password);
    string("DB_NAME", &mut config.database.name);
    string("MG_DOMAIN", &mut config.mailgun.domain);
    string("MG_API_KEY", &mut config.mailgun.api_key);
    string("MG_EMAIL_TO", &mut config.mailgun.recipient);

    if let Some(value) = lookup("ENVIRONMENT") {
        config.environment = value.parse::<Environment>()?;
    }
    if let Some(port) = parsed(&lookup, "SERVER_PORT")? {
        config.server.port = port;
    }
    if let Some(port) = parsed(&lookup, "METRICS_PORT")? {
        config.server.metrics_port = port;
    }
    if let Some(secs) = parsed(&lookup, "JWT_AUTH_TOKEN_EXP")? {
        config.jwt.auth_token_ttl_secs = secs;
    }
    if let Some(secs) = parsed(&lookup, "JWT_REFRESH_TOKEN_EXP")? {
        config.jwt.refresh_token_ttl_secs = secs;
    }

    Ok(())
}

fn parsed<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { key, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides() {
        let env = vars(&[
            ("SERVICE_NAME", "arc"),
            ("SERVER_PORT", "4000"),
            ("METRICS_PORT", "4001"),
            ("ENVIRONMENT", "prod"),
            ("JWT_AUTH_TOKEN_EXP", "60"),
        ]);
        let mut config = ServiceConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).cloned()).unwrap();

        assert_eq!(config.service_name, "arc");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.metrics_port, 4001);
        assert_eq!(config.environment, Environment::Prod);
        assert_eq!(config.jwt.auth_token_ttl_secs, 60);
    }

    #[test]
    fn test_env_override_rejects_bad_values() {
        let env = vars(&[("SERVER_PORT", "http")]);
        let mut config = ServiceConfig::default();
        let err = apply_env_overrides(&mut config, |k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { key: "SERVER_PORT", .. }));

        let env = vars(&[("ENVIRONMENT", "qa")]);
        let err = apply_env_overrides(&mut config, |k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Environment(_)));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000\nmetrics_port = 9000").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("server.metrics_port"));
    }
}
