use std::fmt;

use tracing::Level;

/// Runtime settings read from the process environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub jwt_secret: String,
    pub log_level: Level,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue { name: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::MissingVariable(name) => {
                write!(f, "{} environment variable must be set", name)
            }
            ConfigError::InvalidValue { name, value } => {
                write!(f, "Invalid value for {}: {}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source so tests
    /// never touch the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address =
            lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| ConfigError::MissingVariable("JWT_SECRET".to_string()))?;

        let log_level = match lookup("LOG_LEVEL") {
            Some(value) => value
                .parse::<Level>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "LOG_LEVEL".to_string(),
                    value,
                })?,
            None => Level::INFO,
        };

        Ok(AppConfig {
            bind_address,
            jwt_secret,
            log_level,
        })
    }
}
