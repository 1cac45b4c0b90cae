use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use prodmanager_server::routes;
use prodmanager_server::state::AppState;

use crate::integration::common::{TestApp, setup_test_app, setup_test_app_with};

#[tokio::test]
async fn ping_answers_pong() {
    let app = setup_test_app();

    let (status, json) = app.get("/api/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "pong");
    assert!(json["data"]["timestamp"].is_string());
}

#[tokio::test]
async fn health_reflects_database_state() {
    let app = setup_test_app();

    let (status, json) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "ProdManager API is running!");
    assert_eq!(json["data"]["database"], "connected");

    app.products.set_unavailable(true);
    let (status, json) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Database connection failed");
    assert_eq!(json["data"]["database"], "disconnected");
}

#[tokio::test]
async fn unknown_route_is_enveloped() {
    let app = setup_test_app();

    let (status, json) = app.get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Route not found - /api/nope");
}

#[tokio::test]
async fn wrong_method_is_enveloped() {
    let app = setup_test_app();

    let (status, json) = app.call(Method::PATCH, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Method not allowed");
}

#[tokio::test]
async fn oversized_body_is_enveloped() {
    let app = setup_test_app_with(&[("BODY_LIMIT_BYTES", "200")]);
    let token = app.register("Ann Lee", "ann@x.com", "user").await;

    let (status, json) = app
        .call(
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({
                "title": "Mouse",
                "description": "x".repeat(400),
                "price": 1,
                "image": "https://x.com/m.jpg",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Request body too large");
    assert!(app.products.snapshot().is_empty());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = setup_test_app();

    let (status, json) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["info"]["title"], "ProdManager API");
    assert!(json["paths"]["/api/products/{id}"].is_object());
}

async fn boom() -> &'static str {
    panic!("boom")
}

async fn call_panicking_route(app: &TestApp) -> (StatusCode, Value) {
    let routes: Router<Arc<AppState>> = Router::new().route("/boom", get(boom));
    let router = routes::apply_layers(routes, app.state.clone());

    let response = router
        .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn panics_become_500_envelopes() {
    let app = setup_test_app();

    let (status, json) = call_panicking_route(&app).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Internal server error");
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn panic_detail_is_shown_in_development() {
    let app = setup_test_app_with(&[("APP_ENV", "development")]);

    let (status, json) = call_panicking_route(&app).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("boom"));
}
