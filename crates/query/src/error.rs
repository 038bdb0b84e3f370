//! Query composer error types.

use thiserror::Error;

/// Errors surfaced by the query composer.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Paging or filter input that cannot be turned into a query.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),

    /// A single-entity lookup found no row.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// More than one to-many relation was requested for a single query.
    #[error("cannot eagerly load more than one collection of {entity} at once (requested: {})", relations.join(", "))]
    UnsupportedRelationCombination {
        entity: &'static str,
        relations: Vec<&'static str>,
    },

    /// Any failure reported by the relational store, passed through unchanged.
    #[error("store error")]
    Store(#[from] sqlx::Error),
}

impl QueryError {
    /// Shorthand for [`QueryError::InvalidCriteria`].
    pub fn invalid(message: impl Into<String>) -> Self {
        QueryError::InvalidCriteria(message.into())
    }

    /// Whether this error came from the store rather than from the caller's input.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, QueryError::Store(_))
    }
}

/// Result type alias using QueryError.
pub type QueryResult<T> = Result<T, QueryError>;
