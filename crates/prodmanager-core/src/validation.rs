//! Declarative per-route field rules.
//!
//! A route owns an ordered slice of [`FieldRule`]s. [`validate`] walks them in
//! order and records at most one [`FieldError`] per field (its first failing
//! check). An empty error list means the request may proceed.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// One rejected field, echoed back to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub value: Value,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value,
        }
    }
}

/// Where a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Body,
    Query,
    Param,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

#[derive(Debug)]
pub enum Check {
    /// Character count of a string (numbers and booleans are measured as text).
    Length { min: usize, max: usize },
    /// JSON number or numeric string within bounds.
    Number { min: Option<f64>, max: Option<f64> },
    /// Integer (or integer string) within bounds.
    Integer { min: i64, max: Option<i64> },
    Matches(&'static LazyLock<Regex>),
    OneOf(&'static [&'static str]),
    Email,
    Custom(fn(&Value) -> bool),
}

#[derive(Debug)]
pub struct Rule {
    pub check: Check,
    pub message: &'static str,
}

#[derive(Debug)]
pub struct FieldRule {
    pub field: &'static str,
    pub location: Location,
    pub presence: Presence,
    pub rules: &'static [Rule],
}

/// The three maps a request exposes to validation and handlers.
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
    pub body: Map<String, Value>,
    pub query: Map<String, Value>,
    pub params: Map<String, Value>,
}

impl RequestInput {
    pub fn get(&self, location: Location, field: &str) -> Option<&Value> {
        match location {
            Location::Body => self.body.get(field),
            Location::Query => self.query.get(field),
            Location::Param => self.params.get(field),
        }
    }

    /// String value of a field, if present and a string.
    pub fn str(&self, location: Location, field: &str) -> Option<&str> {
        self.get(location, field).and_then(Value::as_str)
    }
}

/// Run every rule against the input.
pub fn validate(rules: &[FieldRule], input: &RequestInput) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    for field_rule in rules {
        let value = match input.get(field_rule.location, field_rule.field) {
            None | Some(Value::Null) => {
                if field_rule.presence == Presence::Required {
                    errors.push(FieldError::new(
                        field_rule.field,
                        format!("{} is required", field_rule.field),
                        Value::Null,
                    ));
                }
                continue;
            }
            Some(value) => value,
        };

        if let Some(failed) = field_rule.rules.iter().find(|rule| !passes(&rule.check, value)) {
            errors.push(FieldError::new(
                field_rule.field,
                failed.message,
                value.clone(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn passes(check: &Check, value: &Value) -> bool {
    match check {
        Check::Length { min, max } => {
            let len = match value {
                Value::String(s) => s.chars().count(),
                Value::Number(n) => n.to_string().len(),
                Value::Bool(b) => b.to_string().len(),
                _ => return false,
            };
            (*min..=*max).contains(&len)
        }
        Check::Number { min, max } => match as_number(value) {
            Some(n) => min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max),
            None => false,
        },
        Check::Integer { min, max } => match as_integer(value) {
            Some(n) => n >= *min && max.is_none_or(|max| n <= max),
            None => false,
        },
        Check::Matches(pattern) => value.as_str().is_some_and(|s| pattern.is_match(s)),
        Check::OneOf(allowed) => value.as_str().is_some_and(|s| allowed.contains(&s)),
        Check::Email => value.as_str().is_some_and(|s| EMAIL_RE.is_match(s)),
        Check::Custom(predicate) => predicate(value),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Trim and lower-case an email address before lookup or storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Patterns and predicates
// ---------------------------------------------------------------------------

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("valid name pattern"));

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s\-_]+$").expect("valid title pattern"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")
});

/// At least one lowercase letter, one uppercase letter and one digit.
fn is_strong_password(value: &Value) -> bool {
    value.as_str().is_some_and(|s| {
        s.chars().any(|c| c.is_ascii_lowercase())
            && s.chars().any(|c| c.is_ascii_uppercase())
            && s.chars().any(|c| c.is_ascii_digit())
    })
}

/// Absolute http(s) URL with a host.
fn is_web_url(value: &Value) -> bool {
    value
        .as_str()
        .and_then(|s| url::Url::parse(s).ok())
        .is_some_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

fn is_uuid(value: &Value) -> bool {
    value.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok())
}

fn is_non_empty(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Rule sets
// ---------------------------------------------------------------------------

static NAME_CHECKS: [Rule; 2] = [
    Rule {
        check: Check::Length { min: 2, max: 50 },
        message: "Name must be between 2 and 50 characters",
    },
    Rule {
        check: Check::Matches(&NAME_RE),
        message: "Name must contain only letters and spaces",
    },
];

static EMAIL_CHECKS: [Rule; 1] = [Rule {
    check: Check::Email,
    message: "Please provide a valid email address",
}];

static PASSWORD_CHECKS: [Rule; 2] = [
    Rule {
        check: Check::Length { min: 6, max: 100 },
        message: "Password must be between 6 and 100 characters",
    },
    Rule {
        check: Check::Custom(is_strong_password),
        message: "Password must contain at least one uppercase letter, one lowercase letter, and one number",
    },
];

static LOGIN_PASSWORD_CHECKS: [Rule; 1] = [Rule {
    check: Check::Custom(is_non_empty),
    message: "Password is required",
}];

static ROLE_CHECKS: [Rule; 1] = [Rule {
    check: Check::OneOf(&["user", "admin"]),
    message: "Role must be either user or admin",
}];

static TITLE_CHECKS: [Rule; 2] = [
    Rule {
        check: Check::Length { min: 1, max: 100 },
        message: "Title must be between 1 and 100 characters",
    },
    Rule {
        check: Check::Matches(&TITLE_RE),
        message: "Title can only contain letters, numbers, spaces, hyphens, and underscores",
    },
];

static DESCRIPTION_CHECKS: [Rule; 1] = [Rule {
    check: Check::Length { min: 1, max: 500 },
    message: "Description must be between 1 and 500 characters",
}];

static PRICE_CHECKS: [Rule; 1] = [Rule {
    check: Check::Number {
        min: Some(0.0),
        max: None,
    },
    message: "Price must be a positive number",
}];

static IMAGE_CHECKS: [Rule; 1] = [Rule {
    check: Check::Custom(is_web_url),
    message: "Image must be a valid URL",
}];

static ID_CHECKS: [Rule; 1] = [Rule {
    check: Check::Custom(is_uuid),
    message: "Invalid ID format",
}];

pub static REGISTER: &[FieldRule] = &[
    FieldRule {
        field: "name",
        location: Location::Body,
        presence: Presence::Required,
        rules: &NAME_CHECKS,
    },
    FieldRule {
        field: "email",
        location: Location::Body,
        presence: Presence::Required,
        rules: &EMAIL_CHECKS,
    },
    FieldRule {
        field: "password",
        location: Location::Body,
        presence: Presence::Required,
        rules: &PASSWORD_CHECKS,
    },
    FieldRule {
        field: "role",
        location: Location::Body,
        presence: Presence::Optional,
        rules: &ROLE_CHECKS,
    },
];

pub static LOGIN: &[FieldRule] = &[
    FieldRule {
        field: "email",
        location: Location::Body,
        presence: Presence::Required,
        rules: &EMAIL_CHECKS,
    },
    FieldRule {
        field: "password",
        location: Location::Body,
        presence: Presence::Required,
        rules: &LOGIN_PASSWORD_CHECKS,
    },
];

pub static CREATE_PRODUCT: &[FieldRule] = &[
    FieldRule {
        field: "title",
        location: Location::Body,
        presence: Presence::Required,
        rules: &TITLE_CHECKS,
    },
    FieldRule {
        field: "description",
        location: Location::Body,
        presence: Presence::Required,
        rules: &DESCRIPTION_CHECKS,
    },
    FieldRule {
        field: "price",
        location: Location::Body,
        presence: Presence::Required,
        rules: &PRICE_CHECKS,
    },
    FieldRule {
        field: "image",
        location: Location::Body,
        presence: Presence::Required,
        rules: &IMAGE_CHECKS,
    },
];

pub static UPDATE_PRODUCT: &[FieldRule] = &[
    FieldRule {
        field: "id",
        location: Location::Param,
        presence: Presence::Required,
        rules: &ID_CHECKS,
    },
    FieldRule {
        field: "title",
        location: Location::Body,
        presence: Presence::Optional,
        rules: &TITLE_CHECKS,
    },
    FieldRule {
        field: "description",
        location: Location::Body,
        presence: Presence::Optional,
        rules: &DESCRIPTION_CHECKS,
    },
    FieldRule {
        field: "price",
        location: Location::Body,
        presence: Presence::Optional,
        rules: &PRICE_CHECKS,
    },
    FieldRule {
        field: "image",
        location: Location::Body,
        presence: Presence::Optional,
        rules: &IMAGE_CHECKS,
    },
];

pub static PRODUCT_ID: &[FieldRule] = &[FieldRule {
    field: "id",
    location: Location::Param,
    presence: Presence::Required,
    rules: &ID_CHECKS,
}];

static PAGE_CHECKS: [Rule; 1] = [Rule {
    check: Check::Integer { min: 1, max: None },
    message: "Page must be a positive integer",
}];

static LIMIT_CHECKS: [Rule; 1] = [Rule {
    check: Check::Integer {
        min: 1,
        max: Some(100),
    },
    message: "Limit must be between 1 and 100",
}];

static SORT_CHECKS: [Rule; 1] = [Rule {
    check: Check::OneOf(&["id", "title", "price", "createdAt", "updatedAt"]),
    message: "Sort field must be one of: id, title, price, createdAt, updatedAt",
}];

static ORDER_CHECKS: [Rule; 1] = [Rule {
    check: Check::OneOf(&["ASC", "DESC"]),
    message: "Order must be either ASC or DESC",
}];

static KEYWORD_CHECKS: [Rule; 1] = [Rule {
    check: Check::Length { min: 1, max: 50 },
    message: "Keyword must be between 1 and 50 characters",
}];

pub static PRODUCT_QUERY: &[FieldRule] = &[
    FieldRule {
        field: "page",
        location: Location::Query,
        presence: Presence::Optional,
        rules: &PAGE_CHECKS,
    },
    FieldRule {
        field: "limit",
        location: Location::Query,
        presence: Presence::Optional,
        rules: &LIMIT_CHECKS,
    },
    FieldRule {
        field: "sort",
        location: Location::Query,
        presence: Presence::Optional,
        rules: &SORT_CHECKS,
    },
    FieldRule {
        field: "order",
        location: Location::Query,
        presence: Presence::Optional,
        rules: &ORDER_CHECKS,
    },
    FieldRule {
        field: "keyword",
        location: Location::Query,
        presence: Presence::Optional,
        rules: &KEYWORD_CHECKS,
    },
];
