use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub jwt_secret: String,

    pub api_prefix: String,
    pub kiosk_prefix: String,
    pub log_level: String,

    // Rate limiting
    pub rate_kiosk_per_min: u32,
    pub rate_protected_per_min: u32,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value `{raw}`")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Reads the process environment; call `dotenvy::dotenv()` first to pick
    /// up a local `.env`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            api_prefix: or_default("API_PREFIX", "/api".to_string())?,
            kiosk_prefix: or_default("KIOSK_PREFIX", "/kiosk".to_string())?,
            log_level: or_default("LOG_LEVEL", "debug".to_string())?,

            rate_kiosk_per_min: or_default("RATE_KIOSK_PER_MIN", 60)?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,
        })
    }

    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::DEBUG)
    }
}
