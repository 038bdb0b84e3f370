//! Search query builder using SeaQuery.
//!
//! Builds, for one entity type:
//! - the data query: base columns, LEFT JOINs for eager-loaded relations
//!   (aliased by relation name, columns aliased `relation__column`),
//!   predicates, ORDER BY and an optional LIMIT/OFFSET window
//! - the count query: `COUNT(DISTINCT id)` over the same predicates, with no
//!   joins and no window
//!
//! When a collection is eagerly loaded under a window, the window is applied
//! to the parents in a derived table first and the collection is joined onto
//! that page, so LIMIT/OFFSET always counts parent rows.

use std::marker::PhantomData;

use sea_query::{Alias, Expr, JoinType, Order, Query, SelectStatement, SimpleExpr};

use super::mapping::{Entity, Relation, column_name};
use super::relation::LoadPlan;
use super::sort::{ID_COLUMN, ResolvedSort};

/// LIMIT/OFFSET pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

/// Query builder for searches over entity `E`.
pub struct SearchQueryBuilder<'a, E: Entity> {
    predicates: Vec<SimpleExpr>,
    plan: &'a LoadPlan<E::Relation>,
    sort: ResolvedSort,
    entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> SearchQueryBuilder<'a, E> {
    pub fn new(
        predicates: Vec<SimpleExpr>,
        plan: &'a LoadPlan<E::Relation>,
        sort: ResolvedSort,
    ) -> Self {
        Self {
            predicates,
            plan,
            sort,
            entity: PhantomData,
        }
    }

    /// Build the main SELECT query for one page.
    pub fn build_page(&self, offset: u64, limit: u64) -> SelectStatement {
        self.build(Some(Window { offset, limit }))
    }

    /// Build the main SELECT query without paging.
    pub fn build_all(&self) -> SelectStatement {
        self.build(None)
    }

    /// Build the main SELECT query with an optional window.
    pub fn build(&self, window: Option<Window>) -> SelectStatement {
        match (self.plan.to_many(), window) {
            (Some(_), Some(window)) => self.build_windowed_collection(window),
            _ => self.build_flat(window),
        }
    }

    /// Build a COUNT query for total results.
    pub fn build_count(&self) -> SelectStatement {
        let mut query = Query::select();

        // SELECT COUNT(DISTINCT id)
        query.expr(Expr::cust(format!(
            "COUNT(DISTINCT \"{}\".\"{ID_COLUMN}\")",
            E::TABLE
        )));

        query.from(Alias::new(E::TABLE));

        // WHERE conditions (no joins: eager loading never changes the total)
        self.add_filters(&mut query);

        query
    }

    fn build_flat(&self, window: Option<Window>) -> SelectStatement {
        let mut query = Query::select();

        self.add_select_fields(&mut query);
        query.from(Alias::new(E::TABLE));
        self.add_joins(&mut query);
        self.add_filters(&mut query);
        self.add_sorts(&mut query);
        self.add_collection_sort(&mut query);

        if let Some(window) = window {
            query.limit(window.limit);
            query.offset(window.offset);
        }

        query
    }

    /// Page the parents in a derived table named like the base table, then
    /// join every relation onto that page.
    fn build_windowed_collection(&self, window: Window) -> SelectStatement {
        let mut page = Query::select();
        for col in E::COLUMNS {
            page.column((Alias::new(E::TABLE), Alias::new(*col)));
        }
        page.from(Alias::new(E::TABLE));
        self.add_filters(&mut page);
        self.add_sorts(&mut page);
        page.limit(window.limit);
        page.offset(window.offset);

        let mut query = Query::select();
        self.add_select_fields(&mut query);
        query.from_subquery(page, Alias::new(E::TABLE));
        self.add_joins(&mut query);
        self.add_sorts(&mut query);
        self.add_collection_sort(&mut query);

        query
    }

    /// Base columns, then each relation's columns aliased with its prefix.
    fn add_select_fields(&self, query: &mut SelectStatement) {
        for col in E::COLUMNS {
            query.column((Alias::new(E::TABLE), Alias::new(*col)));
        }

        for relation in self.plan.relations() {
            let def = relation.definition();
            let prefix = def.prefix();
            for col in def.columns {
                query.expr_as(
                    Expr::col((Alias::new(def.name), Alias::new(*col))),
                    Alias::new(column_name(&prefix, col)),
                );
            }
        }
    }

    /// Add LEFT JOIN clauses, one per planned relation.
    fn add_joins(&self, query: &mut SelectStatement) {
        for relation in self.plan.relations() {
            let def = relation.definition();

            let on_condition = Expr::col((Alias::new(E::TABLE), Alias::new(def.local_field)))
                .equals((Alias::new(def.name), Alias::new(def.foreign_field)));

            query.join_as(
                JoinType::LeftJoin,
                Alias::new(def.target_table),
                Alias::new(def.name),
                on_condition,
            );
        }
    }

    /// Add WHERE conditions from predicates.
    fn add_filters(&self, query: &mut SelectStatement) {
        for condition in &self.predicates {
            query.and_where(condition.clone());
        }
    }

    /// ORDER BY on the base table, with the `id` tie-break.
    fn add_sorts(&self, query: &mut SelectStatement) {
        for (col, order) in self.sort.terms() {
            query.order_by((Alias::new(E::TABLE), Alias::new(col)), order);
        }
    }

    /// Keep a loaded collection's rows in a stable order within each parent.
    fn add_collection_sort(&self, query: &mut SelectStatement) {
        if let Some(relation) = self.plan.to_many() {
            query.order_by(
                (Alias::new(relation.name()), Alias::new(ID_COLUMN)),
                Order::Asc,
            );
        }
    }
}
