use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::validation::FieldError;

/// Role carried by an account; gates mutating routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image: String,
}

impl NewProduct {
    /// Build from a validated request body.
    ///
    /// Re-checks presence of every field and coerces `price` to a number, so a
    /// write is never attempted with a missing or negative field even if the
    /// route's rule set drifts.
    pub fn from_body(body: &Map<String, Value>) -> Result<Self, AppError> {
        let mut errors = Vec::new();

        let title = required_string(body, "title", &mut errors);
        let description = required_string(body, "description", &mut errors);
        let image = required_string(body, "image", &mut errors);
        let price = match body.get("price") {
            None | Some(Value::Null) => {
                errors.push(FieldError::new("price", "price is required", Value::Null));
                None
            }
            Some(raw) => match coerce_price(raw) {
                Some(price) => Some(price),
                None => {
                    errors.push(FieldError::new(
                        "price",
                        "Price must be a positive number",
                        raw.clone(),
                    ));
                    None
                }
            },
        };

        match (title, description, price, image) {
            (Some(title), Some(description), Some(price), Some(image)) if errors.is_empty() => {
                Ok(Self {
                    title,
                    description,
                    price,
                    image,
                })
            }
            _ => Err(AppError::Validation(errors)),
        }
    }
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
}

impl ProductChanges {
    /// Build from a validated request body; only keys present in the body are changed.
    pub fn from_body(body: &Map<String, Value>) -> Result<Self, AppError> {
        let mut errors = Vec::new();

        let title = optional_string(body, "title", &mut errors);
        let description = optional_string(body, "description", &mut errors);
        let image = optional_string(body, "image", &mut errors);
        let price = match body.get("price") {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let coerced = coerce_price(raw);
                if coerced.is_none() {
                    errors.push(FieldError::new(
                        "price",
                        "Price must be a positive number",
                        raw.clone(),
                    ));
                }
                coerced
            }
        };

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(Self {
            title,
            description,
            price,
            image,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image.is_none()
    }

    /// Apply the present fields onto an existing record.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.title = title.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = &self.image {
            product.image = image.clone();
        }
    }
}

/// Parse a price from a JSON number or numeric string. Rejects negatives and non-finite values.
pub fn coerce_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (price.is_finite() && price >= 0.0).then_some(price)
}

fn required_string(
    body: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match body.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::String(s)) => {
            errors.push(FieldError::new(
                field,
                format!("{field} is required"),
                Value::String(s.clone()),
            ));
            None
        }
        None | Some(Value::Null) => {
            errors.push(FieldError::new(
                field,
                format!("{field} is required"),
                Value::Null,
            ));
            None
        }
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("{field} must be a string"),
                other.clone(),
            ));
            None
        }
    }
}

fn optional_string(
    body: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match body.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("{field} must be a string"),
                other.clone(),
            ));
            None
        }
    }
}

/// A stored account. The password hash never leaves the server.
#[derive(Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role,
        }
    }
}

/// DTO for inserting a new account; `password_hash` is already hashed.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}
