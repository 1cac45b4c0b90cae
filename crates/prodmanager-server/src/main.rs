use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use prodmanager_core::seed::seed_demo_products;
use prodmanager_db::{Database, DatabaseConfig};
use prodmanager_server::config::ServerConfig;
use prodmanager_server::routes;
use prodmanager_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("prodmanager=info".parse()?))
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let addr = format!("0.0.0.0:{}", config.port);

    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    let products = Arc::new(db.product_repo());
    if config.seed_demo_data {
        match seed_demo_products(products.as_ref()).await {
            Ok(0) => tracing::info!("Catalog not empty, skipping demo seed"),
            Ok(count) => tracing::info!(count, "Demo products seeded"),
            Err(e) => tracing::error!(error = %e, "Failed to seed demo products"),
        }
    }

    let state = Arc::new(AppState::new(products, Arc::new(db.user_repo()), config));

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
