#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Eager loading tests: joined relations, paging over collections and the
//! one-collection limit.

mod common;

use common::TestShop;
use shopfront_query::QueryError;
use shopfront_query::models::{
    Order, OrderItem, OrderItemRelation, OrderRelation, Product, ProductRelation, User,
    UserRelation,
};
use shopfront_query::query::{OrderItemSearch, OrderSearch, ProductSearch, SortSpec, UserSearch};
use shopfront_test_utils::{assert, test_order};

fn item_ids(order: &Order) -> Vec<i64> {
    order
        .items
        .as_deref()
        .expect("items should be loaded")
        .iter()
        .map(|i| i.id)
        .collect()
}

#[tokio::test]
async fn test_paging_counts_parents_not_joined_rows() {
    let shop = TestShop::seeded().await;
    let orders = shop.repository::<Order>();

    let first = orders
        .search(
            &OrderSearch::default()
                .with_relations(&[OrderRelation::Items])
                .paged(0, 2),
        )
        .await
        .unwrap();
    assert_eq!(first.total_elements, 5);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.content.len(), 2);
    assert_eq!(item_ids(&first.content[0]), vec![1, 2]);
    assert_eq!(item_ids(&first.content[1]), vec![3]);

    let second = orders
        .search(
            &OrderSearch::default()
                .with_relations(&[OrderRelation::Items])
                .paged(1, 2),
        )
        .await
        .unwrap();
    let ids: Vec<i64> = second.content.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![3, 4]);
    assert_eq!(item_ids(&second.content[0]), vec![4]);
    // Loaded but empty, not "not loaded"
    assert_eq!(second.content[1].items, Some(Vec::new()));

    let last = orders
        .search(
            &OrderSearch::default()
                .with_relations(&[OrderRelation::Items])
                .paged(2, 2),
        )
        .await
        .unwrap();
    assert_eq!(last.content.len(), 1);
    assert_eq!(item_ids(&last.content[0]), vec![5, 6, 7]);
    assert!(!last.has_next);
    assert!(last.has_prev);
}

#[tokio::test]
async fn test_joins_do_not_change_the_total() {
    let shop = TestShop::seeded().await;
    let orders = shop.repository::<Order>();

    let plain = orders
        .search(&OrderSearch {
            product_id: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    let joined = orders
        .search(
            &OrderSearch {
                product_id: Some(3),
                ..Default::default()
            }
            .with_relations(&[OrderRelation::User, OrderRelation::Items]),
        )
        .await
        .unwrap();

    assert_eq!(plain.total_elements, joined.total_elements);
    assert_eq!(joined.total_elements, 2);
    assert_eq!(joined.content.len(), 2);
    // Filtering on one product does not trim the loaded collection
    assert_eq!(item_ids(&joined.content[1]), vec![5, 6, 7]);
}

#[tokio::test]
async fn test_collection_order_follows_parent_sort() {
    let shop = TestShop::seeded().await;
    let page = shop
        .repository::<Order>()
        .search(
            &OrderSearch::default()
                .with_relations(&[OrderRelation::Items])
                .sorted_by(SortSpec::new("orderDate", "desc"))
                .paged(0, 3),
        )
        .await
        .unwrap();

    let ids: Vec<i64> = page.content.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![5, 4, 3]);
    let dates: Vec<i64> = page.content.iter().map(|o| o.order_date).collect();
    assert::non_increasing(&dates);
    assert_eq!(page.content[0].total_price(), Some(55_000 + 60_000 + 30_000));
}

#[tokio::test]
async fn test_order_user_is_joined() {
    let shop = TestShop::seeded().await;
    let page = shop
        .repository::<Order>()
        .search(&OrderSearch::default().with_relations(&[OrderRelation::User]))
        .await
        .unwrap();

    for order in &page.content {
        let user = order.user.as_ref().expect("user should be loaded");
        assert_eq!(Some(user.id), order.user_id);
        assert!(order.items.is_none());
        assert!(user.profile.is_none());
    }
    assert_eq!(page.content[4].user.as_ref().unwrap().username, "park");
}

#[tokio::test]
async fn test_order_without_user() {
    let shop = TestShop::seeded().await;
    test_order(6, 1)
        .without_user()
        .insert(&shop.pool)
        .await
        .unwrap();
    let orders = shop.repository::<Order>();

    let guest = orders
        .find_with_relations(6, &[OrderRelation::User, OrderRelation::Items])
        .await
        .unwrap();
    assert_eq!(guest.user_id, None);
    assert!(guest.user.is_none());
    assert_eq!(guest.items, Some(Vec::new()));

    let kim = orders
        .search(&OrderSearch {
            user_id: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(kim.total_elements, 2);
}

#[tokio::test]
async fn test_product_all_details() {
    let shop = TestShop::seeded().await;
    let products = shop.repository::<Product>();

    let lamp = products.find_with_all_details(1).await.unwrap();
    assert_eq!(lamp.brand.as_ref().unwrap().name, "Acme");
    let category = lamp.category.as_ref().unwrap();
    assert_eq!(category.name, "Desk Lamps");
    assert_eq!(category.parent_id, Some(1));
    assert_eq!(lamp.images.as_ref().unwrap().len(), 2);
    assert_eq!(lamp.thumbnail().unwrap().url, "/img/desk-lamp.jpg");

    let grinder = products.find_with_all_details(7).await.unwrap();
    assert!(grinder.brand.is_none());
    assert!(grinder.category.is_none());
    assert_eq!(grinder.images, Some(Vec::new()));
    assert!(grinder.thumbnail().is_none());
}

#[tokio::test]
async fn test_product_search_with_every_relation() {
    let shop = TestShop::seeded().await;
    let page = shop
        .repository::<Product>()
        .search(
            &ProductSearch {
                keyword: Some("lamp".to_string()),
                ..Default::default()
            }
            .with_all_details(),
        )
        .await
        .unwrap();

    assert_eq!(page.total_elements, 3);
    let image_counts: Vec<usize> = page
        .content
        .iter()
        .map(|p| p.images.as_ref().unwrap().len())
        .collect();
    assert_eq!(image_counts, vec![2, 0, 0]);
    assert!(page.content.iter().all(|p| p.brand.is_some()));
}

#[tokio::test]
async fn test_user_all_details() {
    let shop = TestShop::seeded().await;
    let users = shop.repository::<User>();

    let kim = users.find_with_all_details(1).await.unwrap();
    assert_eq!(
        kim.profile.as_ref().unwrap().nickname.as_deref(),
        Some("kimmy")
    );
    assert_eq!(kim.profile.as_ref().unwrap().gender.as_deref(), Some("F"));
    let addresses = kim.addresses.as_ref().unwrap();
    assert_eq!(addresses.len(), 2);
    assert_eq!(addresses[0].zipcode.as_deref(), Some("04524"));
    assert_eq!(kim.default_address().unwrap().id, 2);
    assert!(kim.orders.is_none());

    let lee = users
        .find_with_relations(2, &[UserRelation::Profile, UserRelation::Addresses])
        .await
        .unwrap();
    assert!(lee.profile.is_none());
    assert_eq!(lee.addresses.as_ref().unwrap().len(), 1);

    let park = users.find_with_all_details(3).await.unwrap();
    assert!(park.profile.is_none());
    assert_eq!(park.addresses, Some(Vec::new()));
    assert!(park.default_address().is_none());
}

#[tokio::test]
async fn test_user_orders_relation() {
    let shop = TestShop::seeded().await;
    let lee = shop
        .repository::<User>()
        .find_with_relations(2, &[UserRelation::Orders])
        .await
        .unwrap();

    let orders = lee.orders.as_ref().unwrap();
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![3, 4]);
    assert!(lee.addresses.is_none());
}

#[tokio::test]
async fn test_order_item_joins_order_and_product() {
    let shop = TestShop::seeded().await;
    let page = shop
        .repository::<OrderItem>()
        .search(
            &OrderItemSearch {
                order_id: Some(1),
                ..Default::default()
            }
            .with_relations(&[OrderItemRelation::Product, OrderItemRelation::Order]),
        )
        .await
        .unwrap();

    assert_eq!(page.total_elements, 2);
    let names: Vec<&str> = page
        .content
        .iter()
        .map(|i| i.product.as_ref().unwrap().name.as_str())
        .collect();
    assert_eq!(names, vec!["Desk Lamp", "Kettle"]);
    assert!(
        page.content
            .iter()
            .all(|i| i.order.as_ref().unwrap().id == 1)
    );
}

#[tokio::test]
async fn test_two_collections_are_rejected_before_querying() {
    let shop = TestShop::seeded().await;
    let users = shop.repository::<User>();

    let err = users
        .search(
            &UserSearch::default()
                .with_relations(&[UserRelation::Addresses, UserRelation::Orders]),
        )
        .await
        .unwrap_err();
    match err {
        QueryError::UnsupportedRelationCombination { entity, relations } => {
            assert_eq!(entity, "user");
            assert_eq!(relations.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = users
        .find_with_relations(1, &[UserRelation::Orders, UserRelation::Addresses])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::UnsupportedRelationCombination { .. }
    ));
    assert_eq!(shop.queries(), 0);
}

#[tokio::test]
async fn test_missing_id_is_not_found() {
    let shop = TestShop::seeded().await;
    let err = shop
        .repository::<User>()
        .find_with_relations(999, &[UserRelation::Profile])
        .await
        .unwrap_err();

    match &err {
        QueryError::NotFound { entity, id } => {
            assert_eq!(*entity, "user");
            assert_eq!(*id, 999);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!err.is_store_failure());

    let err = shop
        .repository::<Product>()
        .find_with_all_details(42)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::NotFound { entity: "product", id: 42 }));
}

#[tokio::test]
async fn test_serialization_skips_unloaded_relations() {
    let shop = TestShop::seeded().await;
    let products = shop.repository::<Product>();

    let bare = products.find_with_relations(1, &[]).await.unwrap();
    let json = serde_json::to_value(&bare).unwrap();
    assert::has_key(&json, "brand_id");
    assert::lacks_key(&json, "brand");
    assert::lacks_key(&json, "images");

    let loaded = products
        .find_with_relations(1, &[ProductRelation::Brand, ProductRelation::Images])
        .await
        .unwrap();
    let json = serde_json::to_value(&loaded).unwrap();
    assert::has_key(&json, "brand");
    assert::has_key(&json, "images");
    assert::lacks_key(&json, "category");
    assert_eq!(json["images"][0]["is_thumbnail"], serde_json::json!(true));
}
