use std::env;

/// Configuration errors raised while reading the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    /// Access token lifetime in minutes
    pub access_token_expires_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_expires_days: i64,
}

impl Config {
    /// Load configuration from the environment, applying defaults where allowed
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", "8080")?,
            database_url: required_var("DATABASE_URL")?,
            access_token_secret: required_var("ACCESS_TOKEN_SECRET")?,
            refresh_token_secret: required_var("REFRESH_TOKEN_SECRET")?,
            access_token_expires_minutes: parse_var("ACCESS_TOKEN_EXPIRES_MINUTES", "15")?,
            refresh_token_expires_days: parse_var("REFRESH_TOKEN_EXPIRES_DAYS", "30")?,
        })
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVariable(name.to_string()))
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw))
}
