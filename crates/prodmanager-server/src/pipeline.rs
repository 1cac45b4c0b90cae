//! The ordered request pipeline shared by every API route.
//!
//! A request is parsed into a [`RequestContext`] and then flows through
//! sanitize, validate, authenticate and authorize. Each stage either passes the
//! context on ([`Step::Continue`]) or stops with a [`Rejection`] that becomes
//! the response ([`Step::Halt`]). Only unexpected failures (storage errors)
//! travel the `Err` path to the error normalizer.

use axum::http::{HeaderMap, header};
use serde_json::{Map, Value};

use prodmanager_core::models::{Principal, Role};
use prodmanager_core::sanitize::sanitize_input;
use prodmanager_core::validation::{FieldRule, RequestInput, validate};

use crate::error::{ApiError, Rejection};
use crate::state::AppState;

/// Roles allowed through by the authorize stage.
#[derive(Debug, Clone, Copy)]
pub enum Access {
    /// No token needed; authenticate and authorize are skipped.
    Public,
    Roles(&'static [Role]),
}

pub const ANY_ROLE: &[Role] = &[Role::User, Role::Admin];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Static description of a route: its field rules and access policy.
#[derive(Debug)]
pub struct Endpoint {
    pub name: &'static str,
    pub rules: &'static [FieldRule],
    pub access: Access,
}

/// What a handler receives once the pipeline lets the request through.
#[derive(Debug, Default)]
pub struct RequestContext {
    pub input: RequestInput,
    /// Set by the authenticate stage on non-public routes.
    pub principal: Option<Principal>,
}

#[derive(Debug)]
pub enum Step {
    Continue(RequestContext),
    Halt(Rejection),
}

impl Step {
    pub fn and_then(self, stage: impl FnOnce(RequestContext) -> Step) -> Step {
        match self {
            Step::Continue(ctx) => stage(ctx),
            halt => halt,
        }
    }
}

/// The parts of an HTTP request the pipeline reads.
pub struct RawRequest<'a> {
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
    pub query: Option<&'a str>,
    pub params: &'a [(&'static str, String)],
}

/// Run every stage for `route`.
pub async fn run(
    state: &AppState,
    route: &Endpoint,
    raw: RawRequest<'_>,
) -> Result<Step, ApiError> {
    let step = parse(&raw)
        .and_then(sanitize)
        .and_then(|ctx| check_rules(route, ctx));

    let ctx = match step {
        Step::Continue(ctx) => ctx,
        halt => return Ok(halt),
    };

    let roles = match route.access {
        Access::Public => return Ok(Step::Continue(ctx)),
        Access::Roles(roles) => roles,
    };

    let step = authenticate(state, raw.headers, ctx)
        .await?
        .and_then(|ctx| authorize(roles, ctx));

    if let Step::Halt(rejection) = &step {
        tracing::warn!(route = route.name, ?rejection, "Credentials rejected");
    }
    Ok(step)
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn parse(raw: &RawRequest<'_>) -> Step {
    let body = if raw.body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match serde_json::from_slice::<Value>(raw.body) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Step::Halt(Rejection::BadRequest(
                    "Request body must be a JSON object".into(),
                ));
            }
            Err(_) => return Step::Halt(Rejection::BadRequest("Invalid JSON payload".into())),
        }
    };

    let mut query = Map::new();
    if let Some(raw_query) = raw.query {
        for (key, value) in url::form_urlencoded::parse(raw_query.as_bytes()) {
            query
                .entry(key.into_owned())
                .or_insert_with(|| Value::String(value.into_owned()));
        }
    }

    let params = raw
        .params
        .iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
        .collect();

    Step::Continue(RequestContext {
        input: RequestInput {
            body,
            query,
            params,
        },
        principal: None,
    })
}

fn sanitize(mut ctx: RequestContext) -> Step {
    sanitize_input(&mut ctx.input);
    Step::Continue(ctx)
}

fn check_rules(route: &Endpoint, ctx: RequestContext) -> Step {
    match validate(route.rules, &ctx.input) {
        Ok(()) => Step::Continue(ctx),
        Err(errors) => Step::Halt(Rejection::Invalid(errors)),
    }
}

async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    mut ctx: RequestContext,
) -> Result<Step, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return Ok(unauthenticated("Not authenticated, no token provided"));
    };

    let user_id = match state.tokens.verify(token).and_then(|claims| claims.user_id()) {
        Ok(id) => id,
        Err(err) => return Ok(unauthenticated(err.to_string())),
    };

    let user = match state.users.find_by_id(user_id).await? {
        Some(user) => user,
        None => return Ok(unauthenticated("User not found")),
    };
    if !user.is_active {
        return Ok(unauthenticated("Account is deactivated"));
    }

    ctx.principal = Some(user.principal());
    Ok(Step::Continue(ctx))
}

fn authorize(roles: &[Role], ctx: RequestContext) -> Step {
    match ctx.principal {
        Some(principal) if principal.has_any_role(roles) => Step::Continue(ctx),
        Some(_) => Step::Halt(Rejection::Forbidden),
        None => unauthenticated("Not authenticated, no token provided"),
    }
}

fn unauthenticated(message: impl Into<String>) -> Step {
    Step::Halt(Rejection::Unauthenticated(message.into()))
}
