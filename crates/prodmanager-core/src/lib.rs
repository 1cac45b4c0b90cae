pub mod error;
pub mod models;
pub mod password;
pub mod query;
pub mod sanitize;
pub mod seed;
pub mod testutil;
pub mod token;
pub mod traits;
pub mod validation;

pub use error::AppError;
pub use models::{NewProduct, NewUser, Principal, Product, ProductChanges, Role, User};
pub use query::{Page, Pagination, ProductQuery, SortField, SortOrder};
pub use token::{Claims, TokenError, TokenService};
pub use traits::{ProductStore, UserStore};
pub use validation::{FieldError, RequestInput};
