use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use prodmanager_core::models::{Product, User};
use prodmanager_core::query::Pagination;
use prodmanager_core::validation::FieldError;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Successful response wrapper shared by every route.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationResponse>,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            pagination: None,
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination.into());
        self
    }
}

/// Failure response wrapper.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldErrorResponse>>,
    /// Failure detail, only present in development mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
            error: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FieldErrorResponse {
    pub field: String,
    pub message: String,
    pub value: serde_json::Value,
}

impl From<FieldError> for FieldErrorResponse {
    fn from(err: FieldError) -> Self {
        Self {
            field: err.field,
            message: err.message,
            value: err.value,
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// `user` (default) or `admin`.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub token: String,
}

impl AuthResponse {
    pub fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.to_string(),
            token,
        }
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Request body for create; every field is optional on update.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ProductRequest {
    pub title: String,
    pub description: String,
    /// Number or numeric string, at least 0.
    pub price: f64,
    pub image: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            description: product.description,
            price: product.price,
            image: product.image,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Query parameters accepted by the product list.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Page number, starting at 1.
    pub page: Option<u64>,
    /// Items per page, 1 to 100.
    pub limit: Option<u64>,
    /// One of `id`, `title`, `price`, `createdAt`, `updatedAt`.
    pub sort: Option<String>,
    /// `ASC` or `DESC`.
    pub order: Option<String>,
    /// Case-insensitive match against title or description.
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl From<Pagination> for PaginationResponse {
    fn from(p: Pagination) -> Self {
        Self {
            current_page: p.current_page,
            total_pages: p.total_pages,
            total_items: p.total_items,
            items_per_page: p.items_per_page,
            has_next_page: p.has_next_page,
            has_prev_page: p.has_prev_page,
        }
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PingResponse {
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub timestamp: DateTime<Utc>,
    /// `connected` or `disconnected`.
    pub database: &'static str,
}
