use prodmanager_core::models::{NewProduct, ProductChanges};
use prodmanager_core::query::{ProductQuery, SortField, SortOrder};
use prodmanager_core::AppError;
use uuid::Uuid;

use crate::integration::common::setup_test_db;

fn product(title: &str, description: &str, price: f64) -> NewProduct {
    NewProduct {
        title: title.into(),
        description: description.into(),
        price,
        image: "https://x.com/m.jpg".into(),
    }
}

#[tokio::test]
async fn create_get_update_delete_roundtrip() {
    let (db, _container) = setup_test_db().await;
    let repo = db.product_repo();

    let created = repo
        .create(&product("Mouse", "Wireless", 25.5))
        .await
        .unwrap();
    assert_eq!(created.title, "Mouse");
    assert_eq!(created.created_at, created.updated_at);

    let fetched = repo.get(created.id).await.unwrap().expect("product exists");
    assert_eq!(fetched, created);

    let updated = repo
        .update(
            created.id,
            &ProductChanges {
                price: Some(30.0),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("product exists");
    assert_eq!(updated.price, 30.0);
    assert_eq!(updated.title, "Mouse");
    assert!(updated.updated_at >= created.updated_at);

    let deleted = repo.delete(created.id).await.unwrap().expect("product exists");
    assert_eq!(deleted.id, created.id);
    assert!(repo.get(created.id).await.unwrap().is_none());
    assert!(repo.delete(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_ids_return_none() {
    let (db, _container) = setup_test_db().await;
    let repo = db.product_repo();

    assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    assert!(
        repo.update(Uuid::new_v4(), &ProductChanges::default())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn list_paginates_and_counts() {
    let (db, _container) = setup_test_db().await;
    let repo = db.product_repo();

    for i in 0..25 {
        repo.create(&product(&format!("Item {i:02}"), "Thing", i as f64))
            .await
            .unwrap();
    }

    let page = repo
        .list(&ProductQuery {
            page: 3,
            limit: 10,
            sort: SortField::Price,
            order: SortOrder::Asc,
            keyword: None,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 25);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.items[0].title, "Item 20");
    assert_eq!(repo.count().await.unwrap(), 25);

    // Equal prices fall back to id order.
    for title in ["Tie A", "Tie B", "Tie C"] {
        repo.create(&product(title, "Thing", 99.0)).await.unwrap();
    }
    let page = repo
        .list(&ProductQuery {
            page: 1,
            limit: 3,
            sort: SortField::Price,
            order: SortOrder::Desc,
            keyword: None,
        })
        .await
        .unwrap();
    assert!(page.items.iter().all(|p| p.price == 99.0));
    let ids: Vec<Uuid> = page.items.iter().map(|p| p.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn keyword_matches_title_or_description_literally() {
    let (db, _container) = setup_test_db().await;
    let repo = db.product_repo();

    repo.create(&product("Mouse", "Wireless", 25.0)).await.unwrap();
    repo.create(&product("Keyboard", "Mouse friendly", 50.0))
        .await
        .unwrap();
    repo.create(&product("Monitor", "50% brighter", 200.0))
        .await
        .unwrap();

    let page = repo
        .list(&ProductQuery {
            keyword: Some("MOUSE".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let page = repo
        .list(&ProductQuery {
            keyword: Some("0%".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "Monitor");
}

#[tokio::test]
async fn negative_price_violates_check_constraint() {
    let (db, _container) = setup_test_db().await;
    let repo = db.product_repo();

    let err = repo
        .create(&product("Mouse", "Wireless", -1.0))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => assert_eq!(errors[0].field, "price"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn health_check_succeeds() {
    let (db, _container) = setup_test_db().await;
    db.health_check().await.unwrap();
    db.product_repo().health_check().await.unwrap();
}
