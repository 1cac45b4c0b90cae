use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chrono::Utc;
use tower_http::catch_panic::CatchPanicLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use prodmanager_core::AppError;
use prodmanager_core::models::{NewProduct, ProductChanges};
use prodmanager_core::query::{Pagination, ProductQuery};
use prodmanager_core::validation::{self, Location};

use crate::auth;
use crate::dto::{
    Envelope, HealthResponse, PingResponse, ProductListQuery, ProductRequest, ProductResponse,
};
use crate::error::{ApiError, normalize_errors, panic_response, route_not_found};
use crate::openapi::ApiDoc;
use crate::pipeline::{
    self, ADMIN_ONLY, ANY_ROLE, Access, Endpoint, RawRequest, RequestContext, Step,
};
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/ping", get(ping))
        .route("/api/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    apply_layers(routes, state)
}

/// Attach the fallback, body limit, panic guard and error normalizer to `routes`.
pub fn apply_layers(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    routes
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(state.config.body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            normalize_errors,
        ))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

static LIST_PRODUCTS: Endpoint = Endpoint {
    name: "list_products",
    rules: validation::PRODUCT_QUERY,
    access: Access::Public,
};

static GET_PRODUCT: Endpoint = Endpoint {
    name: "get_product",
    rules: validation::PRODUCT_ID,
    access: Access::Public,
};

static CREATE_PRODUCT: Endpoint = Endpoint {
    name: "create_product",
    rules: validation::CREATE_PRODUCT,
    access: Access::Roles(ANY_ROLE),
};

static UPDATE_PRODUCT: Endpoint = Endpoint {
    name: "update_product",
    rules: validation::UPDATE_PRODUCT,
    access: Access::Roles(ANY_ROLE),
};

static DELETE_PRODUCT: Endpoint = Endpoint {
    name: "delete_product",
    rules: validation::PRODUCT_ID,
    access: Access::Roles(ADMIN_ONLY),
};

const PRODUCT_NOT_FOUND: &str = "Product not found";

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "One page of products", body = Envelope<Vec<ProductResponse>>),
        (status = 400, description = "Invalid query parameters", body = crate::dto::ErrorEnvelope),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let raw = RawRequest {
        headers: &headers,
        body: &[],
        query: query.as_deref(),
        params: &[],
    };
    let ctx = match pipeline::run(&state, &LIST_PRODUCTS, raw).await? {
        Step::Continue(ctx) => ctx,
        Step::Halt(rejection) => return Ok(rejection.into_response()),
    };

    let query = ProductQuery::from_params(&ctx.input.query)?;
    let page = state.products.list(&query).await?;
    let pagination = Pagination::new(query.page, query.limit, page.total);
    let items: Vec<ProductResponse> = page.items.into_iter().map(Into::into).collect();

    Ok(axum::Json(
        Envelope::ok("Products fetched successfully", items).with_pagination(pagination),
    )
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "The product", body = Envelope<ProductResponse>),
        (status = 400, description = "Malformed id", body = crate::dto::ErrorEnvelope),
        (status = 404, description = "Product not found", body = crate::dto::ErrorEnvelope),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let params = [("id", id)];
    let raw = RawRequest {
        headers: &headers,
        body: &[],
        query: None,
        params: &params,
    };
    let ctx = match pipeline::run(&state, &GET_PRODUCT, raw).await? {
        Step::Continue(ctx) => ctx,
        Step::Halt(rejection) => return Ok(rejection.into_response()),
    };

    let product = state
        .products
        .get(product_id(&ctx)?)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.into()))?;

    Ok(axum::Json(Envelope::ok(
        "Product fetched successfully",
        ProductResponse::from(product),
    ))
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = Envelope<ProductResponse>),
        (status = 400, description = "Validation failed", body = crate::dto::ErrorEnvelope),
        (status = 401, description = "Not authenticated", body = crate::dto::ErrorEnvelope),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let raw = RawRequest {
        headers: &headers,
        body: &body,
        query: None,
        params: &[],
    };
    let ctx = match pipeline::run(&state, &CREATE_PRODUCT, raw).await? {
        Step::Continue(ctx) => ctx,
        Step::Halt(rejection) => return Ok(rejection.into_response()),
    };

    let new_product = NewProduct::from_body(&ctx.input.body)?;
    let product = state.products.create(&new_product).await?;
    tracing::info!(
        product_id = %product.id,
        user_id = ?ctx.principal.map(|p| p.id),
        "Product created"
    );

    Ok((
        StatusCode::CREATED,
        axum::Json(Envelope::ok(
            "Product created successfully",
            ProductResponse::from(product),
        )),
    )
        .into_response())
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body(content = ProductRequest, description = "Any subset of the product fields"),
    responses(
        (status = 200, description = "Product updated", body = Envelope<ProductResponse>),
        (status = 400, description = "Validation failed", body = crate::dto::ErrorEnvelope),
        (status = 401, description = "Not authenticated", body = crate::dto::ErrorEnvelope),
        (status = 404, description = "Product not found", body = crate::dto::ErrorEnvelope),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let params = [("id", id)];
    let raw = RawRequest {
        headers: &headers,
        body: &body,
        query: None,
        params: &params,
    };
    let ctx = match pipeline::run(&state, &UPDATE_PRODUCT, raw).await? {
        Step::Continue(ctx) => ctx,
        Step::Halt(rejection) => return Ok(rejection.into_response()),
    };

    let id = product_id(&ctx)?;
    let changes = ProductChanges::from_body(&ctx.input.body)?;
    let product = state
        .products
        .update(id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.into()))?;
    tracing::info!(
        product_id = %product.id,
        user_id = ?ctx.principal.map(|p| p.id),
        "Product updated"
    );

    Ok(axum::Json(Envelope::ok(
        "Product updated successfully",
        ProductResponse::from(product),
    ))
    .into_response())
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted product snapshot", body = Envelope<ProductResponse>),
        (status = 401, description = "Not authenticated", body = crate::dto::ErrorEnvelope),
        (status = 403, description = "Admin role required", body = crate::dto::ErrorEnvelope),
        (status = 404, description = "Product not found", body = crate::dto::ErrorEnvelope),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let params = [("id", id)];
    let raw = RawRequest {
        headers: &headers,
        body: &[],
        query: None,
        params: &params,
    };
    let ctx = match pipeline::run(&state, &DELETE_PRODUCT, raw).await? {
        Step::Continue(ctx) => ctx,
        Step::Halt(rejection) => return Ok(rejection.into_response()),
    };

    let product = state
        .products
        .delete(product_id(&ctx)?)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.into()))?;
    tracing::info!(
        product_id = %product.id,
        user_id = ?ctx.principal.map(|p| p.id),
        "Product deleted"
    );

    Ok(axum::Json(Envelope::ok(
        "Product deleted successfully",
        ProductResponse::from(product),
    ))
    .into_response())
}

/// The validated `id` path parameter.
fn product_id(ctx: &RequestContext) -> Result<Uuid, ApiError> {
    let raw = ctx.input.str(Location::Param, "id").unwrap_or_default();
    Uuid::parse_str(raw)
        .map_err(|_| AppError::invalid_field("id", "Invalid ID format", raw.into()).into())
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/ping",
    responses((status = 200, description = "Liveness probe", body = Envelope<PingResponse>)),
    tag = "system"
)]
pub async fn ping() -> impl IntoResponse {
    axum::Json(Envelope::ok(
        "pong",
        PingResponse {
            timestamp: Utc::now(),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service and database are up", body = Envelope<HealthResponse>),
        (status = 503, description = "Database unreachable", body = Envelope<HealthResponse>),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let connected = match state.products.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            false
        }
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = Envelope {
        success: connected,
        message: if connected {
            "ProdManager API is running!".to_string()
        } else {
            "Database connection failed".to_string()
        },
        data: Some(HealthResponse {
            timestamp: Utc::now(),
            database: if connected {
                "connected"
            } else {
                "disconnected"
            },
        }),
        pagination: None,
    };

    (status, axum::Json(response))
}
