//! Paginated query execution.
//!
//! Validates paging input, plans eager loading, runs the count and data
//! queries sequentially and folds joined rows back into entities.

use sea_query::SimpleExpr;
use sqlx::Row;
use sqlx::any::AnyRow;

use crate::db::Store;
use crate::error::{QueryError, QueryResult};

use super::criteria::{Criteria, column};
use super::mapping::Entity;
use super::query_builder::{SearchQueryBuilder, Window};
use super::relation::LoadPlan;
use super::sort::{ID_COLUMN, ResolvedSort, resolve};
use super::types::{Page, PageRequest, QueryOptions, SortSpec};

/// Runs searches and lookups against a [`Store`].
///
/// Holds no state besides its limits; every call is independent.
pub struct QueryExecutor<'a> {
    store: &'a dyn Store,
    options: QueryOptions,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a dyn Store, options: QueryOptions) -> Self {
        Self { store, options }
    }

    /// Run a search and return one page plus totals.
    ///
    /// Relation planning and paging validation happen before any query is
    /// issued. The total comes from a separate `COUNT(DISTINCT id)` query over
    /// the same predicates, so neither the window nor eager loading affect it.
    pub async fn search<C: Criteria>(&self, criteria: &C) -> QueryResult<Page<C::Entity>> {
        let plan = LoadPlan::new(<C::Entity as Entity>::NAME, criteria.relations())?;
        criteria.validate()?;
        let (page, size, window) = self.resolve_page(criteria.page())?;
        let sort = resolve::<C::Entity>(criteria.sort());

        let builder = SearchQueryBuilder::<C::Entity>::new(criteria.predicates(), &plan, sort);

        let count_sql = self.store.dialect().render(&builder.build_count());
        tracing::debug!(entity = <C::Entity as Entity>::NAME, sql = %count_sql, "count query");
        let total = self.store.fetch_scalar(&count_sql).await?;

        let data_sql = self.store.dialect().render(&builder.build(Some(window)));
        tracing::debug!(entity = <C::Entity as Entity>::NAME, sql = %data_sql, "data query");
        let rows = self.store.fetch_all(&data_sql).await?;
        let content = fold_rows::<C::Entity>(&rows, &plan)?;

        Ok(Page::new(content, page, size, total))
    }

    /// Load one entity by id with the requested relations.
    pub async fn find_with_relations<E: Entity>(
        &self,
        id: i64,
        relations: &[E::Relation],
    ) -> QueryResult<E> {
        let plan = LoadPlan::new(E::NAME, relations)?;
        self.find_with_plan(id, &plan).await
    }

    /// Load one entity by id with a prepared plan.
    pub async fn find_with_plan<E: Entity>(
        &self,
        id: i64,
        plan: &LoadPlan<E::Relation>,
    ) -> QueryResult<E> {
        let predicates = vec![column(E::TABLE, ID_COLUMN).eq(id)];
        let builder = SearchQueryBuilder::<E>::new(predicates, plan, ResolvedSort::by_id());

        let rows = self.fetch(E::NAME, &builder, None).await?;
        fold_rows::<E>(&rows, plan)?
            .into_iter()
            .next()
            .ok_or(QueryError::NotFound {
                entity: E::NAME,
                id,
            })
    }

    /// Every row of `E`, ordered by `sort`, without relations.
    pub async fn find_all<E: Entity>(&self, sort_spec: &SortSpec) -> QueryResult<Vec<E>> {
        self.list(Vec::new(), &[], sort_spec, None).await
    }

    /// Unpaged listing with explicit predicates and an optional row limit.
    ///
    /// The limit counts parents even when a collection is loaded.
    pub async fn list<E: Entity>(
        &self,
        predicates: Vec<SimpleExpr>,
        relations: &[E::Relation],
        sort_spec: &SortSpec,
        limit: Option<i64>,
    ) -> QueryResult<Vec<E>> {
        let plan = LoadPlan::new(E::NAME, relations)?;
        let window = match limit {
            Some(limit) if limit < 0 => {
                return Err(QueryError::invalid(format!(
                    "limit must not be negative, got {limit}"
                )));
            }
            Some(0) => return Ok(Vec::new()),
            Some(limit) => Some(Window {
                offset: 0,
                limit: limit.unsigned_abs(),
            }),
            None => None,
        };

        let builder = SearchQueryBuilder::<E>::new(predicates, &plan, resolve::<E>(sort_spec));
        let rows = self.fetch(E::NAME, &builder, window).await?;
        Ok(fold_rows::<E>(&rows, &plan)?)
    }

    async fn fetch<E: Entity>(
        &self,
        entity: &'static str,
        builder: &SearchQueryBuilder<'_, E>,
        window: Option<Window>,
    ) -> QueryResult<Vec<AnyRow>> {
        let sql = self.store.dialect().render(&builder.build(window));
        tracing::debug!(entity, sql = %sql, "data query");
        Ok(self.store.fetch_all(&sql).await?)
    }

    /// Validate and default the requested page.
    ///
    /// Returns the page index, the applied size and the LIMIT/OFFSET window.
    fn resolve_page(&self, request: &PageRequest) -> QueryResult<(i64, i64, Window)> {
        let page = request.page.unwrap_or(0);
        if page < 0 {
            return Err(QueryError::invalid(format!(
                "page index must not be negative, got {page}"
            )));
        }

        let size = match request.size {
            None => self.options.default_page_size,
            Some(size) if size < 1 => {
                return Err(QueryError::invalid(format!(
                    "page size must be at least 1, got {size}"
                )));
            }
            Some(size) if size > self.options.max_page_size => {
                tracing::warn!(
                    requested = size,
                    capped = self.options.max_page_size,
                    "page size exceeds maximum, capping"
                );
                self.options.max_page_size
            }
            Some(size) => size,
        };

        let offset = page.checked_mul(size).ok_or_else(|| {
            QueryError::invalid(format!("page {page} of size {size} is out of range"))
        })?;

        Ok((
            page,
            size,
            Window {
                offset: offset.unsigned_abs(),
                limit: size.unsigned_abs(),
            },
        ))
    }
}

/// Fold joined rows into entities.
///
/// Rows for one parent are adjacent (the builder orders by the parent's sort
/// and id before any child column), so a change of parent id starts a new
/// entity. To-one relations are read from a parent's first row; collection
/// rows are appended to it.
fn fold_rows<E: Entity>(
    rows: &[AnyRow],
    plan: &LoadPlan<E::Relation>,
) -> Result<Vec<E>, sqlx::Error> {
    let mut entities: Vec<E> = Vec::new();

    for row in rows {
        let id: i64 = row.try_get(ID_COLUMN)?;

        let is_new = entities.last().is_none_or(|last| last.id() != id);
        if is_new {
            let mut entity = E::from_row(row, "")?;
            for relation in plan.to_one() {
                entity.attach(*relation, row)?;
            }
            entities.push(entity);
        }

        if let (Some(relation), Some(entity)) = (plan.to_many(), entities.last_mut()) {
            entity.attach(relation, row)?;
        }
    }

    Ok(entities)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::db::Dialect;
    use async_trait::async_trait;

    /// Store that fails the test if any query reaches it.
    struct UnreachableStore;

    #[async_trait]
    impl Store for UnreachableStore {
        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }

        async fn fetch_all(&self, sql: &str) -> Result<Vec<AnyRow>, sqlx::Error> {
            panic!("unexpected query: {sql}");
        }

        async fn fetch_scalar(&self, sql: &str) -> Result<i64, sqlx::Error> {
            panic!("unexpected query: {sql}");
        }

        async fn execute(&self, sql: &str) -> Result<u64, sqlx::Error> {
            panic!("unexpected query: {sql}");
        }
    }

    fn executor(store: &dyn Store) -> QueryExecutor<'_> {
        QueryExecutor::new(
            store,
            QueryOptions {
                default_page_size: 20,
                max_page_size: 50,
            },
        )
    }

    #[test]
    fn page_defaults_and_caps() {
        let store = UnreachableStore;
        let executor = executor(&store);

        let (page, size, window) = executor.resolve_page(&PageRequest::default()).unwrap();
        assert_eq!((page, size), (0, 20));
        assert_eq!(window, Window { offset: 0, limit: 20 });

        let (_, size, window) = executor.resolve_page(&PageRequest::new(3, 500)).unwrap();
        assert_eq!(size, 50);
        assert_eq!(window, Window { offset: 150, limit: 50 });
    }

    #[test]
    fn invalid_pages_are_rejected() {
        let store = UnreachableStore;
        let executor = executor(&store);

        for request in [
            PageRequest::new(-1, 10),
            PageRequest::new(0, 0),
            PageRequest::new(0, -5),
            PageRequest::new(i64::MAX, 50),
        ] {
            let err = executor.resolve_page(&request).unwrap_err();
            assert!(matches!(err, QueryError::InvalidCriteria(_)), "{request:?}");
        }
    }

    #[tokio::test]
    async fn rejected_requests_issue_no_queries() {
        use crate::models::{User, UserRelation};
        use crate::query::criteria::UserSearch;

        let store = UnreachableStore;
        let executor = executor(&store);

        let search = UserSearch::default()
            .with_relations(&[UserRelation::Addresses, UserRelation::Orders]);
        let err = executor.search(&search).await.unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedRelationCombination { .. }));

        let err = executor
            .find_with_relations::<User>(1, &[UserRelation::Orders, UserRelation::Addresses])
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedRelationCombination { .. }));

        let err = executor
            .search(&UserSearch::default().paged(-1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidCriteria(_)));

        let none = executor
            .list::<User>(Vec::new(), &[], &SortSpec::default(), Some(0))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
