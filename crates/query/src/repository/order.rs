//! Order and order item finders beyond the shared search surface.

use sea_query::{Alias, Expr, Query};

use crate::error::{QueryError, QueryResult};
use crate::models::{Order, OrderItem, OrderItemRelation, OrderStatus};
use crate::query::aggregate::{self, ProductRanking};
use crate::query::criteria::column;
use crate::query::sort::ID_COLUMN;
use crate::query::{Entity, SortSpec};

use super::{OrderItemRepository, OrderRepository};

impl OrderRepository {
    /// The `limit` most recently placed orders, newest first.
    pub async fn recent(&self, limit: i64) -> QueryResult<Vec<Order>> {
        self.executor()
            .list(Vec::new(), &[], &SortSpec::new("orderDate", "desc"), Some(limit))
            .await
    }

    /// Set an order's status and return the reloaded order.
    pub async fn update_status(&self, order_id: i64, status: OrderStatus) -> QueryResult<Order> {
        let statement = Query::update()
            .table(Alias::new(Order::TABLE))
            .value(Alias::new("status"), status.as_str())
            .and_where(Expr::col(Alias::new(ID_COLUMN)).eq(order_id))
            .to_owned();

        let sql = self.store.dialect().render(&statement);
        tracing::debug!(sql = %sql, "update order status");

        let affected = self.store.execute(&sql).await?;
        if affected == 0 {
            return Err(QueryError::NotFound {
                entity: Order::NAME,
                id: order_id,
            });
        }

        tracing::info!(order_id, status = %status, "order status updated");
        self.find_with_relations(order_id, &[]).await
    }
}

impl OrderItemRepository {
    /// Total price of an order; 0 when it has no items.
    pub async fn total_for_order(&self, order_id: i64) -> QueryResult<i64> {
        aggregate::total_for_order(self.store(), order_id).await
    }

    /// Total quantity ordered of a product; 0 when never ordered.
    pub async fn total_quantity_for_product(&self, product_id: i64) -> QueryResult<i64> {
        aggregate::total_quantity_for_product(self.store(), product_id).await
    }

    /// The `limit` most-ordered products.
    pub async fn top_ordered_products(&self, limit: i64) -> QueryResult<Vec<ProductRanking>> {
        aggregate::top_ordered_products(self.store(), limit).await
    }

    /// Lines of one order with their products loaded.
    pub async fn by_order_with_product(&self, order_id: i64) -> QueryResult<Vec<OrderItem>> {
        let predicates = vec![column(OrderItem::TABLE, "order_id").eq(order_id)];
        self.executor()
            .list(
                predicates,
                &[OrderItemRelation::Product],
                &SortSpec::default(),
                None,
            )
            .await
    }

    /// Lines for any of the given products. An empty list matches nothing.
    pub async fn by_products(&self, product_ids: &[i64]) -> QueryResult<Vec<OrderItem>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let predicates =
            vec![column(OrderItem::TABLE, "product_id").is_in(product_ids.iter().copied())];
        self.executor()
            .list(predicates, &[], &SortSpec::default(), None)
            .await
    }
}
