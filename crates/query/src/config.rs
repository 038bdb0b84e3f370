//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store connection URL (`postgres://…` or `sqlite:…`).
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Page size used when a search does not ask for one (default: 20).
    pub default_page_size: i64,

    /// Largest page size a search may request (default: 100).
    pub max_page_size: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let default_page_size = env::var("DEFAULT_PAGE_SIZE")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .context("DEFAULT_PAGE_SIZE must be a valid integer")?;

        let max_page_size = env::var("MAX_PAGE_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .context("MAX_PAGE_SIZE must be a valid integer")?;

        if default_page_size < 1 || max_page_size < default_page_size {
            anyhow::bail!(
                "page sizes must satisfy 1 <= DEFAULT_PAGE_SIZE ({default_page_size}) <= MAX_PAGE_SIZE ({max_page_size})"
            );
        }

        Ok(Self {
            database_url,
            database_max_connections,
            default_page_size,
            max_page_size,
        })
    }
}
