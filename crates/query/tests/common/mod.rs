#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Each test gets its own in-memory SQLite store with the shop schema, so
//! tests never share rows.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::any::AnyRow;

use shopfront_query::query::QueryOptions;
use shopfront_query::repository::Repository;
use shopfront_query::{Database, Dialect, Store};
use shopfront_test_utils::{
    insert_brand, insert_category, insert_image, shop_pool, test_address, test_order,
    test_order_item, test_product, test_profile, test_user,
};

/// Store wrapper that counts every statement it is asked to run.
pub struct CountingStore {
    inner: Database,
    queries: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Database) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for CountingStore {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<AnyRow>, sqlx::Error> {
        self.record();
        self.inner.fetch_all(sql).await
    }

    async fn fetch_scalar(&self, sql: &str) -> Result<i64, sqlx::Error> {
        self.record();
        self.inner.fetch_scalar(sql).await
    }

    async fn execute(&self, sql: &str) -> Result<u64, sqlx::Error> {
        self.record();
        self.inner.execute(sql).await
    }
}

/// An in-memory shop with a counting store in front of it.
pub struct TestShop {
    pub pool: AnyPool,
    pub store: Arc<CountingStore>,
}

impl TestShop {
    /// Empty schema.
    pub async fn empty() -> Self {
        let pool = shop_pool().await.expect("failed to open test store");
        let database = Database::new(pool.clone(), Dialect::Sqlite);
        Self {
            pool,
            store: Arc::new(CountingStore::new(database)),
        }
    }

    /// Schema plus the standard catalogue from [`seed`].
    pub async fn seeded() -> Self {
        let shop = Self::empty().await;
        seed(&shop.pool).await;
        shop
    }

    pub fn repository<E: shopfront_query::query::Entity>(&self) -> Repository<E> {
        self.repository_with(QueryOptions::default())
    }

    pub fn repository_with<E: shopfront_query::query::Entity>(
        &self,
        options: QueryOptions,
    ) -> Repository<E> {
        let store: Arc<dyn Store> = self.store.clone();
        Repository::new(store, options)
    }

    pub fn queries(&self) -> usize {
        self.store.queries()
    }
}

/// Standard catalogue.
///
/// Products (id, name, price, brand, category):
///   1 Desk Lamp        25000  Acme    Desk Lamps   (2 images, 1 thumbnail)
///   2 Floor Lamp       48000  Acme    Lighting
///   3 Kettle           30000  Globex  Kitchen      (1 image)
///   4 Toaster          42000  Globex  Kitchen
///   5 Lamp Shade        9000  Acme    Lighting
///   6 Blender          55000  Globex  Kitchen
///   7 Coffee Grinder   30000  -       -
///   8 100% Cotton Towel 12000 -       Kitchen
///
/// Users: 1 kim (profile, 2 addresses, address 2 is default), 2 lee
/// (1 address), 3 park (none).
///
/// Orders (id, user, status, items as product×quantity@price):
///   1 kim  DELIVERED  1×2@25000, 3×1@30000
///   2 kim  SHIPPED    5×4@9000
///   3 lee  PENDING    1×1@20000
///   4 lee  CANCELLED  (no items)
///   5 park PENDING    6×1@55000, 3×2@30000, 7×1@30000
pub async fn seed(pool: &AnyPool) {
    insert_brand(pool, 1, "Acme").await.unwrap();
    insert_brand(pool, 2, "Globex").await.unwrap();

    insert_category(pool, 1, "Lighting", None).await.unwrap();
    insert_category(pool, 2, "Kitchen", None).await.unwrap();
    insert_category(pool, 3, "Desk Lamps", Some(1)).await.unwrap();

    let products = [
        test_product(1, "Desk Lamp", 25_000).with_brand(1).with_category(3),
        test_product(2, "Floor Lamp", 48_000).with_brand(1).with_category(1),
        test_product(3, "Kettle", 30_000).with_brand(2).with_category(2),
        test_product(4, "Toaster", 42_000).with_brand(2).with_category(2),
        test_product(5, "Lamp Shade", 9_000).with_brand(1).with_category(1),
        test_product(6, "Blender", 55_000).with_brand(2).with_category(2),
        test_product(7, "Coffee Grinder", 30_000),
        test_product(8, "100% Cotton Towel", 12_000).with_category(2),
    ];
    for product in &products {
        product.insert(pool).await.unwrap();
    }

    insert_image(pool, 1, 1, "/img/desk-lamp.jpg", true).await.unwrap();
    insert_image(pool, 2, 1, "/img/desk-lamp-side.jpg", false)
        .await
        .unwrap();
    insert_image(pool, 3, 3, "/img/kettle.jpg", true).await.unwrap();

    test_user(1, "kim").insert(pool).await.unwrap();
    test_user(2, "lee").insert(pool).await.unwrap();
    test_user(3, "park")
        .with_email("park@shop.test")
        .insert(pool)
        .await
        .unwrap();

    test_profile(1, 1)
        .with_nickname("kimmy")
        .with_gender("F")
        .insert(pool)
        .await
        .unwrap();
    test_address(1, 1)
        .with_zipcode("04524")
        .insert(pool)
        .await
        .unwrap();
    test_address(2, 1)
        .default_address()
        .insert(pool)
        .await
        .unwrap();
    test_address(3, 2).insert(pool).await.unwrap();

    test_order(1, 1).with_status("DELIVERED").insert(pool).await.unwrap();
    test_order(2, 1).with_status("SHIPPED").insert(pool).await.unwrap();
    test_order(3, 2).insert(pool).await.unwrap();
    test_order(4, 2).with_status("CANCELLED").insert(pool).await.unwrap();
    test_order(5, 3).insert(pool).await.unwrap();

    let items = [
        test_order_item(1, 1, 1, 2, 25_000),
        test_order_item(2, 1, 3, 1, 30_000),
        test_order_item(3, 2, 5, 4, 9_000),
        test_order_item(4, 3, 1, 1, 20_000),
        test_order_item(5, 5, 6, 1, 55_000),
        test_order_item(6, 5, 3, 2, 30_000),
        test_order_item(7, 5, 7, 1, 30_000),
    ];
    for item in &items {
        item.insert(pool).await.unwrap();
    }
}
