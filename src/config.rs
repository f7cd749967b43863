use std::env;
use std::path::PathBuf;

use anyhow::Context;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://stress.db?mode=rwc";
pub const DEFAULT_RECENT_LIMIT: usize = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// JSON recommendation catalog; the built-in English one when unset.
    pub catalog_path: Option<PathBuf>,
    pub recent_limit: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let recent_limit = match lookup("STRESS_RECENT_LIMIT").filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("STRESS_RECENT_LIMIT must be a number, got '{raw}'"))?,
            None => DEFAULT_RECENT_LIMIT,
        };

        Ok(Self {
            database_url: lookup("STRESS_DATABASE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            catalog_path: lookup("STRESS_CATALOG")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            recent_limit,
        })
    }
}
