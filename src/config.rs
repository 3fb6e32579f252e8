//! Configuration loaded from the environment.

use crate::domain::assets::MAX_UPLOAD_BYTES;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} env var required")]
    Missing(&'static str),
    #[error("{name} must be a valid port number, got {value:?}")]
    InvalidPort { name: &'static str, value: String },
}

/// Service configuration, constructed once at startup and passed down explicitly.
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: u16,
    /// Shared secret expected in the `x-api-key` header
    pub api_key: String,
    /// Owner of the repository that receives merged videos
    pub github_owner: String,
    /// Repository that receives merged videos
    pub github_repo: String,
    /// Access token for the contents API
    pub github_token: String,
    pub github_branch: String,
    pub github_api_url: String,
    /// Working directory for uploads and merge output
    pub upload_dir: PathBuf,
    /// ffmpeg binary to invoke
    pub ffmpeg_path: PathBuf,
    /// Per-file upload ceiling in bytes
    pub max_upload_bytes: u64,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidPort { name: "PORT", value })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            addr: lookup("ADDR").unwrap_or_else(|| String::from("0.0.0.0")),
            port,
            api_key: required("API_KEY")?,
            github_owner: required("GITHUB_OWNER")?,
            github_repo: required("GITHUB_REPO")?,
            github_token: required("GITHUB_TOKEN")?,
            github_branch: lookup("GITHUB_BRANCH").unwrap_or_else(|| String::from(DEFAULT_BRANCH)),
            github_api_url: lookup("GITHUB_API_URL")
                .unwrap_or_else(|| String::from(DEFAULT_GITHUB_API_URL)),
            upload_dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| String::from("uploads"))),
            ffmpeg_path: PathBuf::from(lookup("FFMPEG_PATH").unwrap_or_else(|| String::from("ffmpeg"))),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}
