//! Test utilities: in-memory implementations of the storage traits.
//!
//! Both stores use `Arc<Mutex<_>>` so clones share state, letting a test keep
//! a handle for assertions after moving another into the server state. The
//! product store mirrors the SQL repository's ordering and search semantics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewProduct, NewUser, Product, ProductChanges, User};
use crate::query::{Page, ProductQuery};
use crate::traits::{ProductStore, UserStore};

// ---------------------------------------------------------------------------
// MemoryProductStore
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemoryProductStore {
    products: Arc<Mutex<Vec<Product>>>,
    last_created: Arc<Mutex<Option<DateTime<Utc>>>>,
    next_error: Arc<Mutex<Option<AppError>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next store call returns `error` instead of touching the data.
    pub fn fail_next(&self, error: AppError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    /// Make `health_check` report the store as unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of every stored product, in insertion order.
    pub fn snapshot(&self) -> Vec<Product> {
        self.products.lock().unwrap().clone()
    }

    fn take_error(&self) -> Result<(), AppError> {
        match self.next_error.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Creation timestamps are strictly increasing so "newest first" is deterministic.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.last_created.lock().unwrap();
        let now = Utc::now();
        let ts = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(ts);
        ts
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self, query: &ProductQuery) -> Result<Page<Product>, AppError> {
        self.take_error()?;
        let mut matching: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| query.compare(a, b));

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let items = matching.into_iter().skip(offset).take(limit).collect();

        Ok(Page { items, total })
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        self.take_error()?;
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, AppError> {
        self.take_error()?;
        let created_at = self.next_timestamp();
        let product = Product {
            id: Uuid::new_v4(),
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            image: product.image.clone(),
            created_at,
            updated_at: created_at,
        };
        self.products.lock().unwrap().push(product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, AppError> {
        self.take_error()?;
        let mut products = self.products.lock().unwrap();
        Ok(products.iter_mut().find(|p| p.id == id).map(|product| {
            changes.apply_to(product);
            product.updated_at = Utc::now();
            product.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        self.take_error()?;
        let mut products = self.products.lock().unwrap();
        Ok(products
            .iter()
            .position(|p| p.id == id)
            .map(|index| products.remove(index)))
    }

    async fn count(&self) -> Result<u64, AppError> {
        self.take_error()?;
        Ok(self.products.lock().unwrap().len() as u64)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Connection("store unavailable".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryUserStore
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<Vec<User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict {
                field: "email".into(),
            });
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_active(&self, email: &str, active: bool) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.email == email).map(|user| {
            user.is_active = active;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}
