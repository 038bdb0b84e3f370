//! Dynamic query composition.
//!
//! Criteria → predicates (+ relation plan + resolved sort) → paginated
//! execution → [`Page`]. Aggregates reuse the predicate helpers but bypass
//! pagination.

pub mod aggregate;
pub mod criteria;
pub mod executor;
pub mod mapping;
pub mod query_builder;
pub mod relation;
pub mod sort;
pub mod types;

pub use aggregate::ProductRanking;
pub use criteria::{Criteria, OrderItemSearch, OrderSearch, ProductSearch, UserSearch};
pub use executor::QueryExecutor;
pub use mapping::{Entity, Record, Relation};
pub use relation::LoadPlan;
pub use sort::{ResolvedSort, SortDirection};
pub use types::{Page, PageRequest, QueryOptions, SortSpec};
