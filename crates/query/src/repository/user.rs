//! Exact user lookups.

use crate::error::QueryResult;
use crate::models::User;

use super::UserRepository;

impl UserRepository {
    /// The user with exactly this email (case-sensitive), if any.
    pub async fn find_by_email(&self, email: &str) -> QueryResult<Option<User>> {
        self.find_first_by("email", email).await
    }

    /// The user with exactly this username (case-sensitive), if any.
    pub async fn find_by_username(&self, username: &str) -> QueryResult<Option<User>> {
        self.find_first_by("username", username).await
    }
}
