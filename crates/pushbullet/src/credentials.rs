//! Credential loading
//!
//! The access token is looked up (in order of priority):
//! 1. The `PB_API_KEY` environment variable
//! 2. `PB_API_KEY` in the config file (~/.config/pushbullet/config)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::error::PushError;

/// Key holding the access token, both in the environment and the config file
pub const API_KEY: &str = "PB_API_KEY";

/// Access token for the Pushbullet API
#[derive(Clone)]
pub struct Credentials {
    pub access_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Load credentials from the environment, falling back to the config file
    pub fn load() -> Result<Self> {
        if let Some(creds) = Self::from_env() {
            return Ok(creds);
        }

        let path = Self::default_config_path().context("Could not determine config directory")?;
        Self::from_file(&path)
    }

    /// Load the token from `PB_API_KEY`, if set and non-empty
    pub fn from_env() -> Option<Self> {
        Self::from_token(&std::env::var(API_KEY).ok()?)
    }

    /// Load the token from a `KEY=value` config file
    ///
    /// A missing or blank token is an authentication failure.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = config::KeyValueFile::open(path)?;
        file.get(API_KEY)
            .and_then(Self::from_token)
            .ok_or(PushError::Auth)
            .with_context(|| {
                format!(
                    "No access token: set {} in the environment or in {}",
                    API_KEY,
                    path.display()
                )
            })
    }

    /// Credentials for an explicit token; blank tokens are rejected
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self {
            access_token: token.to_string(),
        })
    }

    /// Config file the token is read from
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_file()
    }
}
