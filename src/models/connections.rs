use std::env;

use serde::{Deserialize, Serialize};

use crate::errors::DdlError;

/// Where to read a live schema from and which platform to render it with.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConnectionConfig {
    pub platform: String,
    pub database_url: String,
    /// Schema to introspect; sources fall back to their default schema when unset.
    #[serde(default)]
    pub schema: Option<String>,
}

impl ConnectionConfig {
    /// Reads `DDL_PLATFORM`, `DATABASE_URL` and `DDL_SCHEMA`, loading `.env` first.
    pub fn from_env() -> Result<Self, DdlError> {
        dotenv::dotenv().ok();
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| DdlError::Config("DATABASE_URL must be set".to_string()))?;
        let platform = match env::var("DDL_PLATFORM") {
            Ok(platform) => platform,
            Err(_) => platform_from_url(&database_url)?.to_string(),
        };
        let schema = env::var("DDL_SCHEMA").ok().filter(|s| !s.is_empty());

        Ok(Self {
            platform,
            database_url,
            schema,
        })
    }
}

/// Guesses the platform name from a connection URL scheme.
pub fn platform_from_url(database_url: &str) -> Result<&'static str, DdlError> {
    let scheme = database_url
        .split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .unwrap_or_default();
    match scheme.as_str() {
        "postgres" | "postgresql" => Ok("postgresql"),
        "mysql" | "mariadb" => Ok("mysql"),
        "sqlite" => Ok("sqlite"),
        _ => Err(DdlError::Config(format!(
            "cannot derive a platform from database url scheme '{}'; set DDL_PLATFORM",
            scheme
        ))),
    }
}
