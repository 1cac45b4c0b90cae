pub mod config;
pub mod database;
pub mod error;
pub mod product_repository;
pub mod user_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use error::map_sqlx_error;
pub use product_repository::ProductRepository;
pub use user_repository::UserRepository;
