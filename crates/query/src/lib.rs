//! Shopfront query composer.
//!
//! Search, eager loading, sorting, paging and aggregates over the shop's
//! orders, order items, products and users.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod repository;

pub use db::{Database, Dialect, Store};
pub use error::{QueryError, QueryResult};
