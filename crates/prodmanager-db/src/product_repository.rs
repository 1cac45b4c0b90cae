use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prodmanager_core::error::AppError;
use prodmanager_core::models::{NewProduct, Product, ProductChanges};
use prodmanager_core::query::{Page, ProductQuery, SortField};
use prodmanager_core::traits::ProductStore;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use crate::error::map_sqlx_error;

const PRODUCT_COLUMNS: &str = "id, title, description, price, image, created_at, updated_at";

/// Repository for product persistence in PostgreSQL.
#[derive(Clone)]
pub struct ProductRepository {
    pool: Pool<Postgres>,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of products, ordered by the requested column then `id`.
    pub async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, AppError> {
        let pattern = query.keyword.as_deref().map(like_pattern);

        // Column and direction come from closed enums, never from raw input.
        let order_by = match query.sort {
            SortField::Id => format!("id {}", query.order.as_str()),
            sort => format!("{} {}, id ASC", sort.column(), query.order.as_str()),
        };

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::text IS NULL OR title ILIKE $1 OR description ILIKE $1)
            ORDER BY {order_by}
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&pattern)
        .bind(to_i64(query.limit))
        .bind(to_i64(query.offset()))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE ($1::text IS NULL OR title ILIKE $1 OR description ILIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total: total.max(0) as u64,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    pub async fn create(&self, product: &NewProduct) -> Result<Product, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (title, description, price, image)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    /// Apply the present fields; absent ones keep their stored value.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                image = COALESCE($5, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.price)
        .bind(&changes.image)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    /// Delete a product and return its last snapshot.
    pub async fn delete(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    pub async fn count(&self) -> Result<u64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(count.max(0) as u64)
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

/// `ILIKE` pattern matching `keyword` as a literal substring.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    title: String,
    description: String,
    price: f64,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// -- Trait implementation --

#[async_trait]
impl ProductStore for ProductRepository {
    async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, AppError> {
        ProductRepository::list(self, query).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        ProductRepository::get(self, id).await
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, AppError> {
        ProductRepository::create(self, product).await
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, AppError> {
        ProductRepository::update(self, id, changes).await
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        ProductRepository::delete(self, id).await
    }

    async fn count(&self) -> Result<u64, AppError> {
        ProductRepository::count(self).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        ProductRepository::health_check(self).await
    }
}
