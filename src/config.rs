use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the process environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub frontend_url: String,
    pub production: bool,
    pub resend_api_key: Option<String>,
    pub resend_from_email: String,
    pub run_migrations: bool,
    pub search_similarity_threshold: f32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_owned()),
            jwt_secret: required("JWT_SECRET_KEY")?,
            access_token_ttl_secs: parsed("ACCESS_TOKEN_TTL_SECS", 2 * 24 * 60 * 60)?,
            frontend_url: optional("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_owned())
                .trim_end_matches('/')
                .to_owned(),
            production: optional("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production")),
            resend_api_key: optional("RESEND_API_KEY"),
            resend_from_email: optional("RESEND_FROM_EMAIL")
                .unwrap_or_else(|| "ConectaCondo <no-reply@conectacondo.app>".to_owned()),
            run_migrations: parsed("RUN_MIGRATIONS", true)?,
            search_similarity_threshold: parsed("SEARCH_SIMILARITY_THRESHOLD", 0.3)?,
        })
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
