use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prodmanager_core::error::AppError;
use prodmanager_core::models::{NewUser, Role, User};
use prodmanager_core::traits::UserStore;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use crate::error::map_sqlx_error;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, is_active, created_at, updated_at";

/// Repository for account persistence in PostgreSQL.
#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TryInto::try_into).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert an account. The unique email constraint surfaces as a conflict on `email`.
    pub async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.try_into()
    }

    pub async fn set_active(&self, email: &str, active: bool) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET is_active = $2, updated_at = NOW()
            WHERE email = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TryInto::try_into).transpose()
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(AppError::Database)?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// -- Trait implementation --

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        UserRepository::find_by_id(self, id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        UserRepository::find_by_email(self, email).await
    }

    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        UserRepository::create(self, user).await
    }

    async fn set_active(&self, email: &str, active: bool) -> Result<Option<User>, AppError> {
        UserRepository::set_active(self, email, active).await
    }
}
