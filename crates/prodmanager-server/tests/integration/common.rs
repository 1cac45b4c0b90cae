use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use prodmanager_core::testutil::{MemoryProductStore, MemoryUserStore};
use prodmanager_server::config::ServerConfig;
use prodmanager_server::routes;
use prodmanager_server::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router plus handles on the in-memory stores behind it.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub products: MemoryProductStore,
    pub users: MemoryUserStore,
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(&[])
}

/// Build an app whose config reads `vars` on top of a test secret.
pub fn setup_test_app_with(vars: &[(&str, &str)]) -> TestApp {
    let mut env: HashMap<String, String> =
        HashMap::from([("JWT_SECRET".to_string(), TEST_SECRET.to_string())]);
    env.extend(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    let config = ServerConfig::from_lookup(|key| env.get(key).cloned()).unwrap();

    let products = MemoryProductStore::new();
    let users = MemoryUserStore::new();
    let state = Arc::new(AppState::new(
        Arc::new(products.clone()),
        Arc::new(users.clone()),
        config,
    ));

    TestApp {
        router: routes::router(state.clone()),
        state,
        products,
        users,
    }
}

impl TestApp {
    /// Send a request and decode the JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, None, None)).await
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(request(method, uri, token, body)).await
    }

    /// Register an account and return its token.
    pub async fn register(&self, name: &str, email: &str, role: &str) -> String {
        let (status, json) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": "Abcdef1",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {json}");
        json["data"]["token"].as_str().unwrap().to_string()
    }

    /// Create a product through the API and return its id.
    pub async fn create_product(&self, token: &str, title: &str, price: f64) -> String {
        let (status, json) = self
            .call(
                Method::POST,
                "/api/products",
                Some(token),
                Some(product_body(title, price)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
        json["data"]["id"].as_str().unwrap().to_string()
    }
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn product_body(title: &str, price: f64) -> Value {
    json!({
        "title": title,
        "description": format!("{title} description"),
        "price": price,
        "image": "https://x.com/m.jpg",
    })
}
