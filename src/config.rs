//! Environment-driven configuration

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub media_root: PathBuf,
    /// Public prefix under which uploaded media is served.
    pub media_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable '{0}'")]
    Missing(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl AppConfig {
    /// Reads the process environment after loading `.env` when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = parse_or(&lookup, "PORT", 8083u16)?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let media_root = lookup("MEDIA_ROOT").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./media"));
        let media_url = lookup("MEDIA_URL").unwrap_or_else(|| "/media".to_string()).trim_end_matches('/').to_string();

        tracing::info!(port, max_connections, media_root = %media_root.display(), "configuration loaded");
        Ok(Self { port, database_url, max_connections, media_root, media_url })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid { name, reason: e.to_string() }),
        None => Ok(default),
    }
}
