use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewProduct, NewUser, Product, ProductChanges, User};
use crate::query::{Page, ProductQuery};

/// Persists and retrieves catalog products.
///
/// Object-safe so the server can hold any backend as `Arc<dyn ProductStore>`.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// One page of products matching the query, plus the total match count.
    async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    async fn create(&self, product: &NewProduct) -> Result<Product, AppError>;

    /// Apply a partial update. Returns `None` if the product does not exist.
    async fn update(&self, id: Uuid, changes: &ProductChanges)
    -> Result<Option<Product>, AppError>;

    /// Remove a product, returning its last snapshot. `None` if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    async fn count(&self) -> Result<u64, AppError>;

    /// Check that the backing store is reachable.
    async fn health_check(&self) -> Result<(), AppError>;
}

/// Persists and retrieves accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Lookup by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Insert an account. A duplicate email yields [`AppError::Conflict`].
    async fn create(&self, user: &NewUser) -> Result<User, AppError>;

    /// Toggle the `is_active` gate. Returns `None` if no account has that email.
    async fn set_active(&self, email: &str, active: bool) -> Result<Option<User>, AppError>;
}
