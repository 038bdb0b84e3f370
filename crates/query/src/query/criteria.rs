//! Search criteria and the predicates they expand to.
//!
//! Every criteria field is optional. A present filter maps to exactly one
//! condition, conditions are ANDed, and the same list feeds both the data
//! query and the count query.
//!
//! Text filters are case-insensitive contains matches: both the column and
//! the pattern go through SQL `LOWER()`, so they are folded by the same rules,
//! and LIKE wildcards in the input are escaped. Empty or whitespace-only text
//! counts as absent.

use chrono::{DateTime, Utc};
use sea_query::{Alias, BinOper, Cond, Expr, Func, Query, SimpleExpr};
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::models::{
    Order, OrderItem, OrderItemRelation, OrderRelation, OrderStatus, Product, ProductRelation,
    User, UserRelation,
};

use super::mapping::{Entity, Relation};
use super::types::{PageRequest, SortSpec};

/// Escape character used in generated LIKE patterns.
pub const LIKE_ESCAPE: char = '!';

/// A search request for one entity type.
pub trait Criteria {
    type Entity: Entity;

    /// Conditions to AND together, in field order.
    fn predicates(&self) -> Vec<SimpleExpr>;

    /// Relations to eagerly load.
    fn relations(&self) -> &[<Self::Entity as Entity>::Relation];

    fn sort(&self) -> &SortSpec;

    fn page(&self) -> &PageRequest;

    /// Reject inputs that cannot describe any row set, such as inverted ranges.
    fn validate(&self) -> QueryResult<()> {
        Ok(())
    }
}

/// Orders, filtered by owner, contained product, status and placement time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSearch {
    pub user_id: Option<i64>,

    /// Orders with at least one line for this product.
    pub product_id: Option<i64>,

    pub status: Option<OrderStatus>,

    /// Placed at or after (inclusive).
    pub start_date: Option<DateTime<Utc>>,

    /// Placed at or before (inclusive).
    pub end_date: Option<DateTime<Utc>>,

    pub relations: Vec<OrderRelation>,

    #[serde(flatten)]
    pub sort: SortSpec,

    #[serde(flatten)]
    pub page: PageRequest,
}

/// Products, filtered by name keyword, price range, brand and category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSearch {
    pub keyword: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub brand_id: Option<i64>,
    pub category_id: Option<i64>,
    pub relations: Vec<ProductRelation>,

    #[serde(flatten)]
    pub sort: SortSpec,

    #[serde(flatten)]
    pub page: PageRequest,
}

/// Users. `keyword` matches username or email; `username` and `email`
/// each match their own column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSearch {
    pub keyword: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub relations: Vec<UserRelation>,

    #[serde(flatten)]
    pub sort: SortSpec,

    #[serde(flatten)]
    pub page: PageRequest,
}

/// Order lines, filtered by order, product, captured price and quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderItemSearch {
    pub order_id: Option<i64>,
    pub product_id: Option<i64>,

    /// Bounds on the captured unit price.
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,

    pub min_quantity: Option<i64>,
    pub relations: Vec<OrderItemRelation>,

    #[serde(flatten)]
    pub sort: SortSpec,

    #[serde(flatten)]
    pub page: PageRequest,
}

/// Builder methods shared by every criteria type.
macro_rules! criteria_builders {
    ($criteria:ty, $relation:ty) => {
        impl $criteria {
            pub fn with_relations(mut self, relations: &[$relation]) -> Self {
                self.relations = relations.to_vec();
                self
            }

            /// Load every to-one relation plus the permitted collection.
            pub fn with_all_details(mut self) -> Self {
                self.relations = <$relation as Relation>::all_details();
                self
            }

            pub fn sorted_by(mut self, sort: SortSpec) -> Self {
                self.sort = sort;
                self
            }

            pub fn paged(mut self, page: i64, size: i64) -> Self {
                self.page = PageRequest::new(page, size);
                self
            }
        }
    };
}

criteria_builders!(OrderSearch, OrderRelation);
criteria_builders!(ProductSearch, ProductRelation);
criteria_builders!(UserSearch, UserRelation);
criteria_builders!(OrderItemSearch, OrderItemRelation);

impl Criteria for OrderSearch {
    type Entity = Order;

    fn predicates(&self) -> Vec<SimpleExpr> {
        let table = Order::TABLE;
        let mut conditions = Vec::new();

        if let Some(user_id) = self.user_id {
            conditions.push(column(table, "user_id").eq(user_id));
        }
        if let Some(product_id) = self.product_id {
            let containing = Query::select()
                .column((Alias::new(OrderItem::TABLE), Alias::new("order_id")))
                .from(Alias::new(OrderItem::TABLE))
                .and_where(column(OrderItem::TABLE, "product_id").eq(product_id))
                .to_owned();
            conditions.push(column(table, "id").in_subquery(containing));
        }
        if let Some(status) = self.status {
            conditions.push(column(table, "status").eq(status.as_str()));
        }
        if let Some(condition) = range(
            column(table, "order_date"),
            self.start_date.map(|d| d.timestamp()),
            self.end_date.map(|d| d.timestamp()),
        ) {
            conditions.push(condition);
        }

        conditions
    }

    fn relations(&self) -> &[OrderRelation] {
        &self.relations
    }

    fn sort(&self) -> &SortSpec {
        &self.sort
    }

    fn page(&self) -> &PageRequest {
        &self.page
    }

    fn validate(&self) -> QueryResult<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            return Err(QueryError::invalid(format!(
                "start_date {start} is after end_date {end}"
            )));
        }
        Ok(())
    }
}

impl Criteria for ProductSearch {
    type Entity = Product;

    fn predicates(&self) -> Vec<SimpleExpr> {
        let table = Product::TABLE;
        let mut conditions = Vec::new();

        if let Some(keyword) = present(&self.keyword) {
            conditions.push(keyword_match(table, &["name"], keyword));
        }
        if let Some(condition) = range(column(table, "price"), self.min_price, self.max_price) {
            conditions.push(condition);
        }
        if let Some(brand_id) = self.brand_id {
            conditions.push(column(table, "brand_id").eq(brand_id));
        }
        if let Some(category_id) = self.category_id {
            conditions.push(column(table, "category_id").eq(category_id));
        }

        conditions
    }

    fn relations(&self) -> &[ProductRelation] {
        &self.relations
    }

    fn sort(&self) -> &SortSpec {
        &self.sort
    }

    fn page(&self) -> &PageRequest {
        &self.page
    }

    fn validate(&self) -> QueryResult<()> {
        check_range("price", self.min_price, self.max_price)
    }
}

impl Criteria for UserSearch {
    type Entity = User;

    fn predicates(&self) -> Vec<SimpleExpr> {
        let table = User::TABLE;
        let mut conditions = Vec::new();

        if let Some(keyword) = present(&self.keyword) {
            conditions.push(keyword_match(table, &["username", "email"], keyword));
        }
        if let Some(username) = present(&self.username) {
            conditions.push(contains(table, "username", username));
        }
        if let Some(email) = present(&self.email) {
            conditions.push(contains(table, "email", email));
        }

        conditions
    }

    fn relations(&self) -> &[UserRelation] {
        &self.relations
    }

    fn sort(&self) -> &SortSpec {
        &self.sort
    }

    fn page(&self) -> &PageRequest {
        &self.page
    }
}

impl Criteria for OrderItemSearch {
    type Entity = OrderItem;

    fn predicates(&self) -> Vec<SimpleExpr> {
        let table = OrderItem::TABLE;
        let mut conditions = Vec::new();

        if let Some(order_id) = self.order_id {
            conditions.push(column(table, "order_id").eq(order_id));
        }
        if let Some(product_id) = self.product_id {
            conditions.push(column(table, "product_id").eq(product_id));
        }
        if let Some(condition) = range(column(table, "order_price"), self.min_price, self.max_price)
        {
            conditions.push(condition);
        }
        if let Some(min_quantity) = self.min_quantity {
            conditions.push(column(table, "quantity").gte(min_quantity));
        }

        conditions
    }

    fn relations(&self) -> &[OrderItemRelation] {
        &self.relations
    }

    fn sort(&self) -> &SortSpec {
        &self.sort
    }

    fn page(&self) -> &PageRequest {
        &self.page
    }

    fn validate(&self) -> QueryResult<()> {
        check_range("price", self.min_price, self.max_price)
    }
}

/// Qualified column reference.
pub(crate) fn column(table: &str, column: &str) -> Expr {
    Expr::col((Alias::new(table), Alias::new(column)))
}

/// Inclusive range: BETWEEN when both bounds are set, a one-sided
/// comparison for a single bound, nothing otherwise.
fn range(expr: Expr, min: Option<i64>, max: Option<i64>) -> Option<SimpleExpr> {
    match (min, max) {
        (Some(min), Some(max)) => Some(expr.between(min, max)),
        (Some(min), None) => Some(expr.gte(min)),
        (None, Some(max)) => Some(expr.lte(max)),
        (None, None) => None,
    }
}

fn check_range(field: &str, min: Option<i64>, max: Option<i64>) -> QueryResult<()> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(QueryError::invalid(format!(
            "min_{field} {min} is greater than max_{field} {max}"
        ))),
        _ => Ok(()),
    }
}

/// Trimmed text, or `None` when empty.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Case-insensitive contains match on one column:
/// `LOWER(col) LIKE LOWER('%text%') ESCAPE '!'`.
fn contains(table: &str, col: &str, text: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like_wildcards(text));
    Expr::expr(Func::lower(column(table, col))).binary(
        BinOper::Like,
        Expr::cust_with_exprs(
            format!("LOWER($1) ESCAPE '{LIKE_ESCAPE}'"),
            [Expr::val(pattern).into()],
        ),
    )
}

/// Contains match ORed across the searchable columns.
fn keyword_match(table: &str, columns: &[&str], keyword: &str) -> SimpleExpr {
    columns
        .iter()
        .fold(Cond::any(), |cond, col| cond.add(contains(table, col, keyword)))
        .into()
}

/// Escape SQL LIKE wildcard characters (`%`, `_` and the escape itself).
fn escape_like_wildcards(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}
