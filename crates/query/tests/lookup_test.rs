#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Exact-match lookups on users and products.

mod common;

use common::TestShop;
use shopfront_query::models::{Product, User};
use shopfront_test_utils::{test_product, test_user};

#[tokio::test]
async fn test_find_by_username_is_exact() {
    let shop = TestShop::seeded().await;
    test_user(4, "kimberly").insert(&shop.pool).await.unwrap();
    let users = shop.repository::<User>();

    let kim = users.find_by_username("kim").await.unwrap().unwrap();
    assert_eq!(kim.id, 1);
    assert!(kim.profile.is_none());

    let kimberly = users.find_by_username("kimberly").await.unwrap().unwrap();
    assert_eq!(kimberly.id, 4);

    assert!(users.find_by_username("KIM").await.unwrap().is_none());
    assert!(users.find_by_username("ki").await.unwrap().is_none());
    assert!(users.find_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_email_is_exact() {
    let shop = TestShop::seeded().await;
    let users = shop.repository::<User>();

    let park = users.find_by_email("park@shop.test").await.unwrap().unwrap();
    assert_eq!(park.id, 3);
    assert_eq!(park.username, "park");

    assert!(users.find_by_email("shop.test").await.unwrap().is_none());
    assert!(users.find_by_email("PARK@SHOP.TEST").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_name_returns_lowest_id() {
    let shop = TestShop::seeded().await;
    test_product(9, "Kettle", 28_000)
        .insert(&shop.pool)
        .await
        .unwrap();
    let products = shop.repository::<Product>();

    let kettle = products.find_by_name("Kettle").await.unwrap().unwrap();
    assert_eq!(kettle.id, 3);
    assert_eq!(kettle.price, 30_000);
    assert!(kettle.brand.is_none());

    assert!(products.find_by_name("kettle").await.unwrap().is_none());
    assert!(products.find_by_name("Lamp").await.unwrap().is_none());
}

#[tokio::test]
async fn test_lookup_runs_one_query() {
    let shop = TestShop::seeded().await;
    shop.repository::<User>()
        .find_by_email("kim@example.com")
        .await
        .unwrap();
    assert_eq!(shop.queries(), 1);
}
