//! Per-entity repositories.
//!
//! [`Repository`] exposes the search surface shared by every entity; entity
//! specific finders and aggregates live in `impl` blocks on the concrete
//! aliases.

mod order;
mod product;
mod user;

use std::marker::PhantomData;
use std::sync::Arc;

use sea_query::SimpleExpr;

use crate::db::Store;
use crate::error::QueryResult;
use crate::models::{Order, OrderItem, Product, User};
use crate::query::criteria::column;
use crate::query::{Criteria, Entity, LoadPlan, Page, QueryExecutor, QueryOptions, SortSpec};

/// Search, lookup and listing for entity `E`.
pub struct Repository<E> {
    store: Arc<dyn Store>,
    options: QueryOptions,
    entity: PhantomData<fn() -> E>,
}

pub type OrderRepository = Repository<Order>;
pub type OrderItemRepository = Repository<OrderItem>;
pub type ProductRepository = Repository<Product>;
pub type UserRepository = Repository<User>;

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            options: self.options,
            entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn Store>, options: QueryOptions) -> Self {
        Self {
            store,
            options,
            entity: PhantomData,
        }
    }

    fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor::new(self.store.as_ref(), self.options)
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Filtered, sorted page of `E` with the requested relations loaded.
    pub async fn search<C>(&self, criteria: &C) -> QueryResult<Page<E>>
    where
        C: Criteria<Entity = E>,
    {
        self.executor().search(criteria).await
    }

    /// One `E` by id, or [`crate::QueryError::NotFound`].
    pub async fn find_with_relations(&self, id: i64, relations: &[E::Relation]) -> QueryResult<E> {
        self.executor().find_with_relations(id, relations).await
    }

    /// One `E` by id with every to-one relation and its designated collection.
    pub async fn find_with_all_details(&self, id: i64) -> QueryResult<E> {
        let plan = LoadPlan::all_details(E::NAME)?;
        self.executor().find_with_plan(id, &plan).await
    }

    /// Every `E`, unpaged, in the requested order.
    pub async fn find_all(&self, sort: &SortSpec) -> QueryResult<Vec<E>> {
        self.executor().find_all(sort).await
    }

    /// Lowest-id `E` whose `field` equals `value` exactly, without relations.
    async fn find_first_by<V>(&self, field: &str, value: V) -> QueryResult<Option<E>>
    where
        V: Into<SimpleExpr>,
    {
        let predicates = vec![column(E::TABLE, field).eq(value)];
        let found = self
            .executor()
            .list(predicates, &[], &SortSpec::default(), Some(1))
            .await?;
        Ok(found.into_iter().next())
    }
}
