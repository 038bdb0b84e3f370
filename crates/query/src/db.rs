//! Store connection management.
//!
//! The composer only ever talks to the store through [`Store`], which takes
//! rendered SQL text and hands back rows or scalars. [`Database`] is the
//! pool-backed implementation used by the binary and the integration tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_query::{PostgresQueryBuilder, QueryStatementWriter, SqliteQueryBuilder};
use sqlx::AnyPool;
use sqlx::any::{AnyPoolOptions, AnyRow};

use crate::config::Config;

/// SQL dialect used to render statements for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Pick the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Dialect::Postgres)
        } else if url.starts_with("sqlite:") {
            Some(Dialect::Sqlite)
        } else {
            None
        }
    }

    /// Render a statement to SQL text for this dialect.
    pub fn render<S: QueryStatementWriter>(self, statement: &S) -> String {
        match self {
            Dialect::Postgres => statement.to_string(PostgresQueryBuilder),
            Dialect::Sqlite => statement.to_string(SqliteQueryBuilder),
        }
    }
}

/// Query execution seam between the composer and the relational store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Dialect statements must be rendered in.
    fn dialect(&self) -> Dialect;

    /// Run a query and return every row.
    async fn fetch_all(&self, sql: &str) -> Result<Vec<AnyRow>, sqlx::Error>;

    /// Run a query returning a single integer (counts and sums).
    async fn fetch_scalar(&self, sql: &str) -> Result<i64, sqlx::Error>;

    /// Run a statement and return the number of affected rows.
    async fn execute(&self, sql: &str) -> Result<u64, sqlx::Error>;
}

/// Pool-backed [`Store`].
#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
}

impl Database {
    /// Wrap an existing pool.
    pub fn new(pool: AnyPool, dialect: Dialect) -> Self {
        Self { pool, dialect }
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl Store for Database {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<AnyRow>, sqlx::Error> {
        sqlx::query(sql).fetch_all(&self.pool).await
    }

    async fn fetch_scalar(&self, sql: &str) -> Result<i64, sqlx::Error> {
        let value: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(value)
    }

    async fn execute(&self, sql: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Create a connection pool for the configured store.
pub async fn create_pool(config: &Config) -> Result<Database> {
    let dialect = Dialect::from_url(&config.database_url)
        .context("DATABASE_URL must use the postgres:// or sqlite: scheme")?;

    sqlx::any::install_default_drivers();

    let pool = AnyPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to the store")?;

    Ok(Database::new(pool, dialect))
}

/// Check if the store connection is healthy.
pub async fn check_health(store: &dyn Store) -> bool {
    store.fetch_scalar("SELECT CAST(1 AS BIGINT)").await.is_ok()
}
