//! Order and order item models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;

use crate::error::{QueryError, QueryResult};
use crate::query::mapping::{
    Cardinality, Entity, Record, Relation, RelationDef, SortField, get, push_joined,
};

use super::product::Product;
use super::user::User;

/// Order lifecycle status, stored as its upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

/// Order record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: i64,

    /// Unix timestamp when the order was placed.
    pub order_date: i64,

    pub status: OrderStatus,

    pub user_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItem>>,
}

impl Order {
    pub fn ordered_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.order_date, 0)
    }

    /// Sum of line totals over the loaded items; `None` when items were not loaded.
    pub fn total_price(&self) -> Option<i64> {
        self.items
            .as_deref()
            .map(|items| items.iter().map(OrderItem::line_total).sum())
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub quantity: i64,

    /// Unit price captured when the order was placed.
    pub order_price: i64,

    pub order_id: Option<i64>,
    pub product_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.order_price * self.quantity
    }
}

/// Input for creating an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
    pub order_price: i64,
}

impl NewOrderItem {
    /// Order `quantity` units of `product` at its current price.
    ///
    /// The price is captured here and never re-read from the product.
    pub fn for_product(product: &Product, quantity: i64) -> QueryResult<Self> {
        if quantity < 1 {
            return Err(QueryError::invalid(format!(
                "quantity must be at least 1, got {quantity}"
            )));
        }
        Ok(Self {
            product_id: product.id,
            quantity,
            order_price: product.price,
        })
    }

    pub fn line_total(&self) -> i64 {
        self.order_price * self.quantity
    }
}

/// Relations of [`Order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderRelation {
    User,
    Items,
}

impl Relation for OrderRelation {
    const ALL: &'static [Self] = &[OrderRelation::User, OrderRelation::Items];

    fn definition(self) -> RelationDef {
        match self {
            OrderRelation::User => RelationDef {
                name: "user",
                target_table: "users",
                columns: User::COLUMNS,
                local_field: "user_id",
                foreign_field: "id",
                cardinality: Cardinality::ToOne,
            },
            OrderRelation::Items => RelationDef {
                name: "items",
                target_table: "order_items",
                columns: OrderItem::COLUMNS,
                local_field: "id",
                foreign_field: "order_id",
                cardinality: Cardinality::ToMany,
            },
        }
    }

    fn all_details() -> Vec<Self> {
        Self::ALL.to_vec()
    }
}

/// Relations of [`OrderItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderItemRelation {
    Order,
    Product,
}

impl Relation for OrderItemRelation {
    const ALL: &'static [Self] = &[OrderItemRelation::Order, OrderItemRelation::Product];

    fn definition(self) -> RelationDef {
        match self {
            OrderItemRelation::Order => RelationDef {
                name: "order",
                target_table: "orders",
                columns: Order::COLUMNS,
                local_field: "order_id",
                foreign_field: "id",
                cardinality: Cardinality::ToOne,
            },
            OrderItemRelation::Product => RelationDef {
                name: "product",
                target_table: "products",
                columns: Product::COLUMNS,
                local_field: "product_id",
                foreign_field: "id",
                cardinality: Cardinality::ToOne,
            },
        }
    }

    fn all_details() -> Vec<Self> {
        Self::ALL.to_vec()
    }
}

impl Record for Order {
    const COLUMNS: &'static [&'static str] = &["id", "order_date", "status", "user_id"];

    fn from_row(row: &AnyRow, prefix: &str) -> Result<Self, sqlx::Error> {
        let status: String = get(row, prefix, "status")?;
        let status = status
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;

        Ok(Self {
            id: get(row, prefix, "id")?,
            order_date: get(row, prefix, "order_date")?,
            status,
            user_id: get(row, prefix, "user_id")?,
            user: None,
            items: None,
        })
    }
}

impl Entity for Order {
    type Relation = OrderRelation;

    const NAME: &'static str = "order";
    const TABLE: &'static str = "orders";
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("orderDate", "order_date"),
        SortField::new("status", "status"),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn attach(&mut self, relation: OrderRelation, row: &AnyRow) -> Result<(), sqlx::Error> {
        let prefix = relation.definition().prefix();
        match relation {
            OrderRelation::User => self.user = User::from_joined_row(row, &prefix)?,
            OrderRelation::Items => push_joined(&mut self.items, row, &prefix)?,
        }
        Ok(())
    }
}

impl Record for OrderItem {
    const COLUMNS: &'static [&'static str] =
        &["id", "quantity", "order_price", "order_id", "product_id"];

    fn from_row(row: &AnyRow, prefix: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: get(row, prefix, "id")?,
            quantity: get(row, prefix, "quantity")?,
            order_price: get(row, prefix, "order_price")?,
            order_id: get(row, prefix, "order_id")?,
            product_id: get(row, prefix, "product_id")?,
            order: None,
            product: None,
        })
    }
}

impl Entity for OrderItem {
    type Relation = OrderItemRelation;

    const NAME: &'static str = "order item";
    const TABLE: &'static str = "order_items";
    const SORT_FIELDS: &'static [SortField] = &[
        SortField::new("id", "id"),
        SortField::new("quantity", "quantity"),
        SortField::new("orderPrice", "order_price"),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn attach(&mut self, relation: OrderItemRelation, row: &AnyRow) -> Result<(), sqlx::Error> {
        let prefix = relation.definition().prefix();
        match relation {
            OrderItemRelation::Order => self.order = Order::from_joined_row(row, &prefix)?,
            OrderItemRelation::Product => self.product = Product::from_joined_row(row, &prefix)?,
        }
        Ok(())
    }
}
