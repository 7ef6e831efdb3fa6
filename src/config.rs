//! Configuration management for crate-digger.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the local data directory:
//!
//! - Linux: `~/.local/share/crate-digger/.env`
//! - macOS: `~/Library/Application Support/crate-digger/.env`
//! - Windows: `%LOCALAPPDATA%/crate-digger/.env`
//!
//! Variables already present in the environment win over the file. Only the
//! Spotify client id and secret are required; everything else has a default.

use std::{env, path::PathBuf};

use thiserror::Error;
use tracing::debug;

pub const APP_DIR: &str = "crate-digger";

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Cannot prepare data directory: {0}")]
    DataDir(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub server_addr: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub database_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let server_addr =
            get("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());
        let redirect_uri = get("SPOTIFY_API_REDIRECT_URI")
            .unwrap_or_else(|| format!("http://{}/callback", server_addr));

        Ok(Config {
            client_id: require("SPOTIFY_API_AUTH_CLIENT_ID")?,
            client_secret: require("SPOTIFY_API_AUTH_CLIENT_SECRET")?,
            server_addr,
            redirect_uri,
            auth_url: get("SPOTIFY_API_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: get("SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_url: get("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            database_path: get("CRATE_DIGGER_DATABASE")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir().join("cache.db")),
        })
    }
}

/// Resolves the internal identity the operator acts as.
pub fn account_id(flag: Option<String>) -> Result<String, ConfigError> {
    flag.or_else(|| env::var("CRATE_DIGGER_ACCOUNT").ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing("CRATE_DIGGER_ACCOUNT"))
}

pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Loads `.env` from the data directory into the process environment.
///
/// A missing file is not an error; required values may come straight from
/// the environment.
pub async fn load_env() -> Result<(), ConfigError> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::DataDir(e.to_string()))?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) => debug!(path = %path.display(), error = %e, "no environment file loaded"),
    }
    Ok(())
}
