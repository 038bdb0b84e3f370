//! Eager-load planning.
//!
//! Every requested relation is fetched with a LEFT JOIN in the same round
//! trip. Any number of to-one relations can be joined together, but at most
//! one to-many: two collections joined side by side multiply into a cartesian
//! product and can no longer be folded back into parents.

use crate::error::{QueryError, QueryResult};

use super::mapping::Relation;

/// Validated set of relations to eagerly load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan<R> {
    to_one: Vec<R>,
    to_many: Option<R>,
}

impl<R: Relation> LoadPlan<R> {
    /// Nothing joined.
    pub fn none() -> Self {
        Self {
            to_one: Vec::new(),
            to_many: None,
        }
    }

    /// Plan the requested relations for `entity`.
    ///
    /// Duplicates are ignored. More than one distinct to-many relation is
    /// rejected with [`QueryError::UnsupportedRelationCombination`].
    pub fn new(entity: &'static str, requested: &[R]) -> QueryResult<Self> {
        let mut relations = requested.to_vec();
        relations.sort();
        relations.dedup();

        let (to_many, to_one): (Vec<R>, Vec<R>) = relations
            .into_iter()
            .partition(|r| r.definition().is_to_many());

        if to_many.len() > 1 {
            return Err(QueryError::UnsupportedRelationCombination {
                entity,
                relations: to_many.iter().map(|r| r.name()).collect(),
            });
        }

        Ok(Self {
            to_one,
            to_many: to_many.into_iter().next(),
        })
    }

    /// Every to-one relation plus the entity's designated collection.
    pub fn all_details(entity: &'static str) -> QueryResult<Self> {
        Self::new(entity, &R::all_details())
    }

    pub fn to_one(&self) -> &[R] {
        &self.to_one
    }

    pub fn to_many(&self) -> Option<R> {
        self.to_many
    }

    pub fn is_empty(&self) -> bool {
        self.to_one.is_empty() && self.to_many.is_none()
    }

    /// All planned relations, to-one first.
    pub fn relations(&self) -> impl Iterator<Item = R> + '_ {
        self.to_one.iter().copied().chain(self.to_many)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{OrderRelation, ProductRelation, UserRelation};

    #[test]
    fn empty_request_is_a_no_op() {
        let plan = LoadPlan::<OrderRelation>::new("order", &[]).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan, LoadPlan::none());
    }

    #[test]
    fn splits_to_one_and_to_many() {
        let plan = LoadPlan::new("order", &[OrderRelation::Items, OrderRelation::User]).unwrap();
        assert_eq!(plan.to_one(), &[OrderRelation::User]);
        assert_eq!(plan.to_many(), Some(OrderRelation::Items));
    }

    #[test]
    fn duplicates_collapse() {
        let plan = LoadPlan::new(
            "product",
            &[ProductRelation::Images, ProductRelation::Images, ProductRelation::Brand],
        )
        .unwrap();
        assert_eq!(plan.to_one(), &[ProductRelation::Brand]);
        assert_eq!(plan.to_many(), Some(ProductRelation::Images));
    }

    #[test]
    fn two_collections_are_rejected() {
        let err = LoadPlan::new("user", &[UserRelation::Addresses, UserRelation::Orders])
            .unwrap_err();
        match err {
            QueryError::UnsupportedRelationCombination { entity, relations } => {
                assert_eq!(entity, "user");
                assert_eq!(relations, vec!["addresses", "orders"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn all_details_is_always_valid() {
        let plan = LoadPlan::<UserRelation>::all_details("user").unwrap();
        assert_eq!(plan.to_one(), &[UserRelation::Profile]);
        assert_eq!(plan.to_many(), Some(UserRelation::Addresses));

        let plan = LoadPlan::<ProductRelation>::all_details("product").unwrap();
        assert_eq!(plan.to_one().len(), 2);
        assert_eq!(plan.to_many(), Some(ProductRelation::Images));
    }
}
