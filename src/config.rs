use std::{env, net::SocketAddr};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://notes.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    /// `["*"]` permits any origin.
    pub cors_allow_origins: Vec<String>,
    pub bind_addr: SocketAddr,
}

/// Reads the configuration from the process environment, after loading a
/// `.env` file if one exists.
pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::info!("Loaded environment from {}", path.display());
    }

    load_from(|key| env::var(key).ok())
}

fn load_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let database_url =
        lookup("NOTES_DB_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

    let cors_allow_origins = lookup("CORS_ALLOW_ORIGINS")
        .unwrap_or_else(|| "*".to_string())
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(ToString::to_string)
        .collect();

    let bind_addr = lookup("NOTES_BIND_ADDR")
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
        .parse::<SocketAddr>()
        .map_err(|e| format!("Failed to parse NOTES_BIND_ADDR: {e}"))?;

    Ok(Config {
        database_url,
        cors_allow_origins,
        bind_addr,
    })
}
