use axum::http::{Method, StatusCode};
use serde_json::json;

use prodmanager_core::traits::UserStore;

use crate::integration::common::{setup_test_app, product_body, request};

#[tokio::test]
async fn register_returns_token_and_profile() {
    let app = setup_test_app();

    let (status, json) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Ann Lee", "email": "ann@x.com", "password": "Abcdef1"})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "User registered successfully");
    assert_eq!(json["data"]["name"], "Ann Lee");
    assert_eq!(json["data"]["email"], "ann@x.com");
    assert_eq!(json["data"]["role"], "user");
    assert!(json["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(json["data"].get("password").is_none());
    assert_eq!(app.users.len(), 1);
}

#[tokio::test]
async fn register_normalizes_email() {
    let app = setup_test_app();
    app.register("Ann Lee", "  Ann@X.com ", "user").await;

    let user = app.users.find_by_email("ann@x.com").await.unwrap();
    assert!(user.is_some());
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = setup_test_app();
    app.register("Ann Lee", "ann@x.com", "user").await;

    let (status, json) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Ann Other", "email": "ANN@x.com", "password": "Abcdef1"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "User already exists with this email");
    assert_eq!(app.users.len(), 1);
}

#[tokio::test]
async fn register_reports_each_invalid_field_once() {
    let app = setup_test_app();

    let (status, json) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "A1", "email": "not-an-email", "password": "abc", "role": "root"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Validation failed");
    let errors = json["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors.iter().map(|e| e["field"].as_str().unwrap()).collect();
    assert_eq!(fields, vec!["name", "email", "password", "role"]);
    assert_eq!(errors[2]["message"], "Password must be between 6 and 100 characters");
    assert_eq!(errors[3]["value"], "root");
    assert!(app.users.is_empty());
}

#[tokio::test]
async fn register_requires_fields() {
    let app = setup_test_app();

    let (status, json) = app
        .call(Method::POST, "/api/auth/register", None, Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["message"], "name is required");
    assert_eq!(json["errors"][0]["value"], serde_json::Value::Null);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = setup_test_app();

    let request = axum::http::Request::post("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"email\": "))
        .unwrap();
    let (status, json) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Invalid JSON payload");
}

#[tokio::test]
async fn login_succeeds_with_correct_password() {
    let app = setup_test_app();
    app.register("Ann Lee", "ann@x.com", "admin").await;

    let (status, json) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ann@x.com", "password": "Abcdef1"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Login successful");
    assert_eq!(json["data"]["role"], "admin");
    assert!(json["data"]["token"].is_string());
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = setup_test_app();
    app.register("Ann Lee", "ann@x.com", "user").await;

    for body in [
        json!({"email": "ann@x.com", "password": "Wrong12"}),
        json!({"email": "bob@x.com", "password": "Abcdef1"}),
    ] {
        let (status, json) = app
            .call(Method::POST, "/api/auth/login", None, Some(body))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn deactivated_account_cannot_log_in_or_use_token() {
    let app = setup_test_app();
    let token = app.register("Ann Lee", "ann@x.com", "user").await;
    app.users.set_active("ann@x.com", false).await.unwrap();

    let (status, json) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "ann@x.com", "password": "Abcdef1"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Account is deactivated");

    let (status, json) = app
        .send(request(
            Method::POST,
            "/api/products",
            Some(&token),
            Some(product_body("Mouse", 19.99)),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Account is deactivated");
    assert!(app.products.snapshot().is_empty());
}
