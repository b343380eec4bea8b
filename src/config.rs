// src/config.rs

use std::fmt;

use crate::error::ImportError;

pub const API_KEY_VAR: &str = "INTERNAL_AIRTABLE_API_KEY";
pub const API_URL_VAR: &str = "AIRTABLE_API_URL";
pub const DEFAULT_API_URL: &str = "https://api.airtable.com";

/// Everything the remote client needs. Built once at startup and handed down.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
}

impl Config {
    /// Read from the process environment (after any `.env` has been loaded).
    pub fn from_env() -> Result<Self, ImportError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ImportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR).ok_or(ImportError::MissingApiKey(API_KEY_VAR))?;
        let api_url = non_empty(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self { api_key, api_url })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}
