//! Aggregates over order items.
//!
//! These bypass paging: each runs exactly one query and returns a scalar or a
//! short list. Sums are `COALESCE`d to 0 and cast to BIGINT so every dialect
//! hands back an integer.

use sea_query::{Alias, Expr, JoinType, Order, Query, SelectStatement, SimpleExpr};
use serde::Serialize;
use sqlx::any::AnyRow;

use crate::db::Store;
use crate::error::{QueryError, QueryResult};
use crate::models::{OrderItem, Product};

use super::criteria::column;
use super::mapping::{Entity, Record, get};

/// Alias of the ranking derived table and its quantity column.
const RANKING: &str = "ranking";
const TOTAL_QUANTITY: &str = "total_quantity";

/// A product with the total quantity ordered across all orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRanking {
    pub product: Product,
    pub total_quantity: i64,
}

/// `SUM(order_price * quantity)` over the lines of one order; 0 when it has none.
pub async fn total_for_order(store: &dyn Store, order_id: i64) -> QueryResult<i64> {
    let query = total_for_order_query(order_id);
    scalar(store, &query).await
}

/// `SUM(quantity)` over every line for one product; 0 when it was never ordered.
pub async fn total_quantity_for_product(store: &dyn Store, product_id: i64) -> QueryResult<i64> {
    let query = total_quantity_for_product_query(product_id);
    scalar(store, &query).await
}

/// The `limit` most-ordered products by total quantity, ties broken by
/// product id ascending. A limit of 0 returns nothing without querying.
pub async fn top_ordered_products(
    store: &dyn Store,
    limit: i64,
) -> QueryResult<Vec<ProductRanking>> {
    if limit < 0 {
        return Err(QueryError::invalid(format!(
            "limit must not be negative, got {limit}"
        )));
    }
    if limit == 0 {
        return Ok(Vec::new());
    }

    let sql = store
        .dialect()
        .render(&top_ordered_products_query(limit.unsigned_abs()));
    tracing::debug!(sql = %sql, "top ordered products");

    let rows = store.fetch_all(&sql).await?;
    let rankings = rows
        .iter()
        .map(ranking_from_row)
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(rankings)
}

async fn scalar(store: &dyn Store, query: &SelectStatement) -> QueryResult<i64> {
    let sql = store.dialect().render(query);
    tracing::debug!(sql = %sql, "aggregate query");
    Ok(store.fetch_scalar(&sql).await?)
}

fn summed(expression: &str) -> SimpleExpr {
    Expr::cust(format!("CAST(COALESCE(SUM({expression}), 0) AS BIGINT)"))
}

fn qualified(column: &str) -> String {
    format!("\"{}\".\"{column}\"", OrderItem::TABLE)
}

fn total_for_order_query(order_id: i64) -> SelectStatement {
    Query::select()
        .expr(summed(&format!(
            "{} * {}",
            qualified("order_price"),
            qualified("quantity")
        )))
        .from(Alias::new(OrderItem::TABLE))
        .and_where(column(OrderItem::TABLE, "order_id").eq(order_id))
        .to_owned()
}

fn total_quantity_for_product_query(product_id: i64) -> SelectStatement {
    Query::select()
        .expr(summed(&qualified("quantity")))
        .from(Alias::new(OrderItem::TABLE))
        .and_where(column(OrderItem::TABLE, "product_id").eq(product_id))
        .to_owned()
}

/// Rank product ids in a derived table, then join the products onto it.
fn top_ordered_products_query(limit: u64) -> SelectStatement {
    let quantity_sum = format!("SUM({})", qualified("quantity"));

    let ranking = Query::select()
        .column((Alias::new(OrderItem::TABLE), Alias::new("product_id")))
        .expr_as(
            Expr::cust(format!("CAST({quantity_sum} AS BIGINT)")),
            Alias::new(TOTAL_QUANTITY),
        )
        .from(Alias::new(OrderItem::TABLE))
        .and_where(column(OrderItem::TABLE, "product_id").is_not_null())
        .group_by_col((Alias::new(OrderItem::TABLE), Alias::new("product_id")))
        .order_by_expr(Expr::cust(quantity_sum), Order::Desc)
        .order_by(
            (Alias::new(OrderItem::TABLE), Alias::new("product_id")),
            Order::Asc,
        )
        .limit(limit)
        .to_owned();

    let mut query = Query::select();
    for col in Product::COLUMNS {
        query.column((Alias::new(Product::TABLE), Alias::new(*col)));
    }
    query
        .column((Alias::new(RANKING), Alias::new(TOTAL_QUANTITY)))
        .from(Alias::new(Product::TABLE))
        .join_subquery(
            JoinType::InnerJoin,
            ranking,
            Alias::new(RANKING),
            column(Product::TABLE, "id").equals((Alias::new(RANKING), Alias::new("product_id"))),
        )
        .order_by((Alias::new(RANKING), Alias::new(TOTAL_QUANTITY)), Order::Desc)
        .order_by((Alias::new(Product::TABLE), Alias::new("id")), Order::Asc);

    query
}

fn ranking_from_row(row: &AnyRow) -> Result<ProductRanking, sqlx::Error> {
    Ok(ProductRanking {
        product: Product::from_row(row, "")?,
        total_quantity: get(row, "", TOTAL_QUANTITY)?,
    })
}
