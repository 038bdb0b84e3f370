//! Exact product lookups.

use crate::error::QueryResult;
use crate::models::Product;

use super::ProductRepository;

impl ProductRepository {
    /// The lowest-id product named exactly `name`, if any.
    pub async fn find_by_name(&self, name: &str) -> QueryResult<Option<Product>> {
        self.find_first_by("name", name).await
    }
}
