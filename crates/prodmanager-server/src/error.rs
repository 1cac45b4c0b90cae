use std::any::Any;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use prodmanager_core::error::AppError;
use prodmanager_core::validation::FieldError;

use crate::dto::ErrorEnvelope;
use crate::state::AppState;

const INTERNAL_MESSAGE: &str = "Internal server error";
const FORBIDDEN_MESSAGE: &str = "Access denied. Insufficient permissions";

/// Wrapper so we can implement `IntoResponse` for `AppError`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self(AppError::Serialization(err))
    }
}

/// Detail of a 500, carried on the response so the normalizer can expose it in development.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, envelope) = match self.0 {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorEnvelope::new("Validation failed").with_errors(errors),
            ),
            err @ (AppError::Conflict { .. } | AppError::ForeignKey) => {
                (StatusCode::BAD_REQUEST, ErrorEnvelope::new(err.to_string()))
            }
            AppError::Authentication(message) => {
                (StatusCode::UNAUTHORIZED, ErrorEnvelope::new(message))
            }
            AppError::Authorization(message) => (StatusCode::FORBIDDEN, ErrorEnvelope::new(message)),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorEnvelope::new(message)),
            AppError::WithStatus { status, message } => {
                match StatusCode::from_u16(status) {
                    Ok(status) => (status, ErrorEnvelope::new(message)),
                    Err(_) => return internal(format!("invalid status {status}: {message}")),
                }
            }
            AppError::Serialization(err) => (
                StatusCode::BAD_REQUEST,
                ErrorEnvelope::new(format!("Invalid request payload: {err}")),
            ),
            AppError::Connection(detail) => {
                tracing::error!(error = %detail, "Database connection failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorEnvelope::new("Database connection failed"),
                )
            }
            other => return internal(other.to_string()),
        };

        (status, axum::Json(envelope)).into_response()
    }
}

fn internal(detail: String) -> Response {
    tracing::error!(error = %detail, "Unhandled error");
    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(ErrorEnvelope::new(INTERNAL_MESSAGE)),
    )
        .into_response();
    response.extensions_mut().insert(ErrorDetail(detail));
    response
}

// ---------------------------------------------------------------------------
// Pipeline rejections
// ---------------------------------------------------------------------------

/// An expected early exit from the request pipeline. Not an error.
#[derive(Debug, PartialEq)]
pub enum Rejection {
    /// The body could not be read as a JSON object.
    BadRequest(String),
    Invalid(Vec<FieldError>),
    Unauthenticated(String),
    Forbidden,
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::BadRequest(message) => AppError::WithStatus {
                status: 400,
                message,
            },
            Rejection::Invalid(errors) => AppError::Validation(errors),
            Rejection::Unauthenticated(message) => AppError::Authentication(message),
            Rejection::Forbidden => AppError::Authorization(FORBIDDEN_MESSAGE.into()),
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        ApiError(self.into()).into_response()
    }
}

// ---------------------------------------------------------------------------
// Terminal normalization
// ---------------------------------------------------------------------------

/// Last stage of every request: no framework error leaves without the envelope.
///
/// Non-JSON error responses (unknown method, oversized body, ...) are re-rendered,
/// and in development mode a 500 carries its detail under `error`.
pub async fn normalize_errors(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    let status = response.status();

    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let detail = response.extensions().get::<ErrorDetail>().cloned();
    let expose = state.config.environment.is_development() && detail.is_some();

    if is_json(&response) && !expose {
        return response;
    }

    let mut envelope = if is_json(&response) {
        ErrorEnvelope::new(INTERNAL_MESSAGE)
    } else {
        ErrorEnvelope::new(fallback_message(status, &path))
    };
    if expose {
        envelope.error = detail.map(|d| d.0);
    }

    (status, axum::Json(envelope)).into_response()
}

/// Fallback for unmatched routes.
pub async fn route_not_found(uri: axum::http::Uri) -> ApiError {
    ApiError(AppError::NotFound(format!("Route not found - {}", uri.path())))
}

/// Converts a handler panic into the envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    internal(format!("panic: {detail}"))
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

fn fallback_message(status: StatusCode, path: &str) -> String {
    match status {
        StatusCode::NOT_FOUND => format!("Route not found - {path}"),
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed".into(),
        StatusCode::PAYLOAD_TOO_LARGE => "Request body too large".into(),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "Unsupported media type".into(),
        status if status.is_server_error() => INTERNAL_MESSAGE.into(),
        status => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    }
}
