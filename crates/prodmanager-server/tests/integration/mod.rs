pub mod common;
mod auth_tests;
mod system_tests;
