use std::sync::Arc;

use prodmanager_core::token::TokenService;
use prodmanager_core::traits::{ProductStore, UserStore};

use crate::config::ServerConfig;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(
        products: Arc<dyn ProductStore>,
        users: Arc<dyn UserStore>,
        config: ServerConfig,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);
        Self {
            products,
            users,
            tokens,
            config,
        }
    }
}
