pub mod common;
mod product_tests;
mod user_tests;
