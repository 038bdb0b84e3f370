//! Shopfront test utilities.
//!
//! Helpers for integration testing: an in-memory store with the shop schema,
//! builder-style row fixtures, and assertion utilities.

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

/// Shop schema in portable DDL (runs on SQLite and Postgres).
///
/// Ids are supplied by the fixtures, so there is no sequence or autoincrement.
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE users (
        id BIGINT PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL
    )",
    "CREATE TABLE user_profiles (
        id BIGINT PRIMARY KEY,
        nickname TEXT,
        gender TEXT,
        user_id BIGINT UNIQUE REFERENCES users(id)
    )",
    "CREATE TABLE addresses (
        id BIGINT PRIMARY KEY,
        zipcode TEXT,
        detail TEXT,
        is_default BIGINT NOT NULL DEFAULT 0,
        user_id BIGINT REFERENCES users(id)
    )",
    "CREATE TABLE brands (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE categories (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        parent_id BIGINT REFERENCES categories(id)
    )",
    "CREATE TABLE products (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        price BIGINT NOT NULL,
        brand_id BIGINT REFERENCES brands(id),
        category_id BIGINT REFERENCES categories(id)
    )",
    "CREATE TABLE product_images (
        id BIGINT PRIMARY KEY,
        url TEXT NOT NULL,
        is_thumbnail BIGINT NOT NULL DEFAULT 0,
        product_id BIGINT REFERENCES products(id)
    )",
    "CREATE TABLE orders (
        id BIGINT PRIMARY KEY,
        order_date BIGINT NOT NULL,
        status TEXT NOT NULL,
        user_id BIGINT REFERENCES users(id)
    )",
    "CREATE TABLE order_items (
        id BIGINT PRIMARY KEY,
        quantity BIGINT NOT NULL,
        order_price BIGINT NOT NULL,
        order_id BIGINT REFERENCES orders(id),
        product_id BIGINT REFERENCES products(id)
    )",
];

/// Unix timestamp used as the base for fixture order dates (2024-01-01T00:00:00Z).
pub const BASE_TIMESTAMP: i64 = 1_704_067_200;

/// Open a single-connection in-memory SQLite pool.
///
/// The pool keeps its one connection alive for its whole lifetime; an
/// in-memory database disappears with the connection that created it.
pub async fn memory_pool() -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();

    AnyPoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

/// Create every shop table.
pub async fn install_schema(pool: &AnyPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// In-memory pool with the schema installed.
pub async fn shop_pool() -> Result<AnyPool, sqlx::Error> {
    let pool = memory_pool().await?;
    install_schema(&pool).await?;
    Ok(pool)
}

/// Create a test user with default values.
pub fn test_user(id: i64, username: &str) -> TestUser {
    TestUser {
        id,
        username: username.to_string(),
        email: format!("{username}@example.com"),
    }
}

/// A test user builder.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl TestUser {
    /// Set the email.
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub async fn insert(&self, pool: &AnyPool) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO users (id, username, email) VALUES (?, ?, ?)")
            .bind(self.id)
            .bind(self.username.clone())
            .bind(self.email.clone())
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Create a test profile for a user.
pub fn test_profile(id: i64, user_id: i64) -> TestProfile {
    TestProfile {
        id,
        nickname: None,
        gender: None,
        user_id,
    }
}

/// A test profile builder.
#[derive(Debug, Clone)]
pub struct TestProfile {
    pub id: i64,
    pub nickname: Option<String>,
    pub gender: Option<String>,
    pub user_id: i64,
}

impl TestProfile {
    /// Set the nickname.
    pub fn with_nickname(mut self, nickname: &str) -> Self {
        self.nickname = Some(nickname.to_string());
        self
    }

    /// Set the gender.
    pub fn with_gender(mut self, gender: &str) -> Self {
        self.gender = Some(gender.to_string());
        self
    }

    pub async fn insert(&self, pool: &AnyPool) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO user_profiles (id, nickname, gender, user_id) VALUES (?, ?, ?, ?)")
            .bind(self.id)
            .bind(self.nickname.clone())
            .bind(self.gender.clone())
            .bind(self.user_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Create a test address for a user.
pub fn test_address(id: i64, user_id: i64) -> TestAddress {
    TestAddress {
        id,
        zipcode: "00000".to_string(),
        detail: format!("Address {id}"),
        is_default: 0,
        user_id,
    }
}

/// A test address builder.
#[derive(Debug, Clone)]
pub struct TestAddress {
    pub id: i64,
    pub zipcode: String,
    pub detail: String,
    pub is_default: i64,
    pub user_id: i64,
}

impl TestAddress {
    /// Mark as the default address.
    pub fn default_address(mut self) -> Self {
        self.is_default = 1;
        self
    }

    /// Set the zipcode.
    pub fn with_zipcode(mut self, zipcode: &str) -> Self {
        self.zipcode = zipcode.to_string();
        self
    }

    pub async fn insert(&self, pool: &AnyPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO addresses (id, zipcode, detail, is_default, user_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(self.id)
        .bind(self.zipcode.clone())
        .bind(self.detail.clone())
        .bind(self.is_default)
        .bind(self.user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Insert a brand.
pub async fn insert_brand(pool: &AnyPool, id: i64, name: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO brands (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert a category, optionally under a parent.
pub async fn insert_category(
    pool: &AnyPool,
    id: i64,
    name: &str,
    parent_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO categories (id, name, parent_id) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name.to_string())
        .bind(parent_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Create a test product with default values.
pub fn test_product(id: i64, name: &str, price: i64) -> TestProduct {
    TestProduct {
        id,
        name: name.to_string(),
        price,
        brand_id: None,
        category_id: None,
    }
}

/// A test product builder.
#[derive(Debug, Clone)]
pub struct TestProduct {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub brand_id: Option<i64>,
    pub category_id: Option<i64>,
}

impl TestProduct {
    /// Set the brand.
    pub fn with_brand(mut self, brand_id: i64) -> Self {
        self.brand_id = Some(brand_id);
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub async fn insert(&self, pool: &AnyPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO products (id, name, price, brand_id, category_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(self.id)
        .bind(self.name.clone())
        .bind(self.price)
        .bind(self.brand_id)
        .bind(self.category_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Insert a product image.
pub async fn insert_image(
    pool: &AnyPool,
    id: i64,
    product_id: i64,
    url: &str,
    is_thumbnail: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO product_images (id, url, is_thumbnail, product_id) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(url.to_string())
        .bind(i64::from(is_thumbnail))
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Create a test order placed `id` hours after [`BASE_TIMESTAMP`].
pub fn test_order(id: i64, user_id: i64) -> TestOrder {
    TestOrder {
        id,
        order_date: BASE_TIMESTAMP + id * 3_600,
        status: "PENDING".to_string(),
        user_id: Some(user_id),
    }
}

/// A test order builder.
#[derive(Debug, Clone)]
pub struct TestOrder {
    pub id: i64,
    pub order_date: i64,
    pub status: String,
    pub user_id: Option<i64>,
}

impl TestOrder {
    /// Set the order date (Unix seconds).
    pub fn placed_at(mut self, order_date: i64) -> Self {
        self.order_date = order_date;
        self
    }

    /// Set the status by its stored name (`PENDING`, `SHIPPED`, ...).
    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    /// Detach from any user.
    pub fn without_user(mut self) -> Self {
        self.user_id = None;
        self
    }

    pub async fn insert(&self, pool: &AnyPool) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO orders (id, order_date, status, user_id) VALUES (?, ?, ?, ?)")
            .bind(self.id)
            .bind(self.order_date)
            .bind(self.status.clone())
            .bind(self.user_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Create a test order line.
pub fn test_order_item(
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i64,
    order_price: i64,
) -> TestOrderItem {
    TestOrderItem {
        id,
        quantity,
        order_price,
        order_id,
        product_id: Some(product_id),
    }
}

/// A test order line builder.
#[derive(Debug, Clone)]
pub struct TestOrderItem {
    pub id: i64,
    pub quantity: i64,
    pub order_price: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
}

impl TestOrderItem {
    /// Detach from its product (a line whose product was removed).
    pub fn without_product(mut self) -> Self {
        self.product_id = None;
        self
    }

    pub async fn insert(&self, pool: &AnyPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO order_items (id, quantity, order_price, order_id, product_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(self.id)
        .bind(self.quantity)
        .bind(self.order_price)
        .bind(self.order_id)
        .bind(self.product_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Assertion helpers.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value does not have a specific key.
    pub fn lacks_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_none(),
            "Expected JSON to NOT have key '{key}', got: {value}"
        );
    }

    /// Assert that keys are in non-decreasing order.
    pub fn non_decreasing<K: PartialOrd + std::fmt::Debug>(keys: &[K]) {
        assert!(
            keys.windows(2).all(|w| w[0] <= w[1]),
            "Expected non-decreasing order, got: {keys:?}"
        );
    }

    /// Assert that keys are in non-increasing order.
    pub fn non_increasing<K: PartialOrd + std::fmt::Debug>(keys: &[K]) {
        assert!(
            keys.windows(2).all(|w| w[0] >= w[1]),
            "Expected non-increasing order, got: {keys:?}"
        );
    }
}
