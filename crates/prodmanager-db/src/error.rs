use prodmanager_core::AppError;
use prodmanager_core::validation::FieldError;
use serde_json::Value;
use sqlx::postgres::PgDatabaseError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NOT_NULL_VIOLATION: &str = "23502";
const CHECK_VIOLATION: &str = "23514";

/// Classify a sqlx failure into the application taxonomy by SQLSTATE.
pub fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(db) => {
            let constraint = db.constraint().map(constraint_field);
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => AppError::Conflict {
                    field: constraint.unwrap_or_else(|| "value".into()),
                },
                Some(FOREIGN_KEY_VIOLATION) => AppError::ForeignKey,
                Some(NOT_NULL_VIOLATION) => {
                    let field = db
                        .try_downcast_ref::<PgDatabaseError>()
                        .and_then(|pg| pg.column())
                        .unwrap_or("value")
                        .to_string();
                    let message = format!("{field} is required");
                    AppError::Validation(vec![FieldError::new(field, message, Value::Null)])
                }
                Some(CHECK_VIOLATION) => {
                    let field = constraint.unwrap_or_else(|| "value".into());
                    let message = format!("Invalid value for {field}");
                    AppError::Validation(vec![FieldError::new(field, message, Value::Null)])
                }
                _ => AppError::Database(db.message().to_string()),
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
            AppError::Connection(err.to_string())
        }
        sqlx::Error::Io(e) => AppError::Connection(e.to_string()),
        sqlx::Error::Tls(e) => AppError::Connection(e.to_string()),
        other => AppError::Database(other.to_string()),
    }
}

/// `products_price_check` -> `price`, `users_email_key` -> `email`.
fn constraint_field(constraint: &str) -> String {
    let stem = ["_key", "_fkey", "_check", "_pkey"]
        .iter()
        .find_map(|suffix| constraint.strip_suffix(suffix))
        .unwrap_or(constraint);
    match stem.split_once('_') {
        Some((_table, field)) if !field.is_empty() => field.to_string(),
        _ => stem.to_string(),
    }
}
