//! REST API server: request pipeline, routes, envelope DTOs, and OpenAPI documentation.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod openapi;
pub mod pipeline;
pub mod routes;
pub mod state;
