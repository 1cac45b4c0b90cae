use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use prodmanager_core::AppError;
use prodmanager_core::models::{NewUser, Role};
use prodmanager_core::password::{hash_password_blocking, verify_password_blocking};
use prodmanager_core::validation::{self, normalize_email};

use crate::dto::{AuthResponse, Envelope, LoginRequest, RegisterRequest};
use crate::error::ApiError;
use crate::pipeline::{self, Access, Endpoint, RawRequest, Step};
use crate::state::AppState;

static REGISTER: Endpoint = Endpoint {
    name: "register",
    rules: validation::REGISTER,
    access: Access::Public,
};

static LOGIN: Endpoint = Endpoint {
    name: "login",
    rules: validation::LOGIN,
    access: Access::Public,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = Envelope<AuthResponse>),
        (status = 400, description = "Validation failed or email taken", body = crate::dto::ErrorEnvelope),
    ),
    tag = "auth"
)]
pub async fn register(
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
    let ctx = match pipeline::run(&state, &REGISTER, raw).await? {
        Step::Continue(ctx) => ctx,
        Step::Halt(rejection) => return Ok(rejection.into_response()),
    };

    let request: RegisterRequest = serde_json::from_value(Value::Object(ctx.input.body))?;
    let email = normalize_email(&request.email);

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::WithStatus {
            status: 400,
            message: "User already exists with this email".into(),
        }
        .into());
    }

    let role = match request.role.as_deref() {
        None => Role::default(),
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| AppError::invalid_field("role", e, raw.into()))?,
    };

    let password_hash = hash_password_blocking(request.password).await?;
    let user = state
        .users
        .create(&NewUser {
            name: request.name,
            email,
            password_hash,
            role,
        })
        .await?;

    let token = state.tokens.issue(user.id).map_err(AppError::from)?;
    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok((
        StatusCode::CREATED,
        axum::Json(Envelope::ok(
            "User registered successfully",
            AuthResponse::new(user, token),
        )),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = Envelope<AuthResponse>),
        (status = 400, description = "Validation failed", body = crate::dto::ErrorEnvelope),
        (status = 401, description = "Bad credentials or inactive account", body = crate::dto::ErrorEnvelope),
    ),
    tag = "auth"
)]
pub async fn login(
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
    let ctx = match pipeline::run(&state, &LOGIN, raw).await? {
        Step::Continue(ctx) => ctx,
        Step::Halt(rejection) => return Ok(rejection.into_response()),
    };

    let request: LoginRequest = serde_json::from_value(Value::Object(ctx.input.body))?;
    let email = normalize_email(&request.email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        tracing::warn!("Login rejected: unknown email");
        return Err(AppError::Authentication(INVALID_CREDENTIALS.into()).into());
    };

    if !user.is_active {
        tracing::warn!(user_id = %user.id, "Login rejected: account deactivated");
        return Err(AppError::Authentication("Account is deactivated".into()).into());
    }

    if !verify_password_blocking(request.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::Authentication(INVALID_CREDENTIALS.into()).into());
    }

    let token = state.tokens.issue(user.id).map_err(AppError::from)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(axum::Json(Envelope::ok("Login successful", AuthResponse::new(user, token))).into_response())
}
