use prodmanager_core::AppError;
use prodmanager_core::models::{NewUser, Role};

use crate::integration::common::setup_test_db;

fn ann() -> NewUser {
    NewUser {
        name: "Ann Lee".into(),
        email: "ann@x.com".into(),
        password_hash: "$argon2id$placeholder".into(),
        role: Role::User,
    }
}

#[tokio::test]
async fn create_and_find_user() {
    let (db, _container) = setup_test_db().await;
    let repo = db.user_repo();

    let created = repo.create(&ann()).await.unwrap();
    assert!(created.is_active);
    assert_eq!(created.role, Role::User);

    let by_email = repo.find_by_email("ann@x.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, created.id);

    let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "ann@x.com");

    assert!(repo.find_by_email("bob@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let (db, _container) = setup_test_db().await;
    let repo = db.user_repo();

    repo.create(&ann()).await.unwrap();
    let err = repo.create(&ann()).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict { ref field } if field == "email"));
}

#[tokio::test]
async fn set_active_toggles_gate() {
    let (db, _container) = setup_test_db().await;
    let repo = db.user_repo();

    repo.create(&NewUser {
        role: Role::Admin,
        ..ann()
    })
    .await
    .unwrap();

    let user = repo.set_active("ann@x.com", false).await.unwrap().unwrap();
    assert!(!user.is_active);
    assert_eq!(user.role, Role::Admin);

    let user = repo.set_active("ann@x.com", true).await.unwrap().unwrap();
    assert!(user.is_active);

    assert!(repo.set_active("bob@x.com", false).await.unwrap().is_none());
}
