use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod middleware;
mod models;
mod recommendation;
mod repositories;
mod routes;
mod state;

use common::database::{DatabaseConfig, init_pool};

use crate::middleware::TokenVerifier;
use crate::recommendation::RecommendationEngine;
use crate::repositories::{CatalogRepository, OrderRepository, ProfileRepository};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    common::database::run_migrations(&pool).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let token_verifier = TokenVerifier::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize repositories
    let order_repository = OrderRepository::new(pool.clone());
    let catalog_repository = CatalogRepository::new(pool.clone());
    let profile_repository = ProfileRepository::new(pool.clone());
    let recommendation_engine = RecommendationEngine::new(pool.clone());

    let app_state = AppState {
        db_pool: pool,
        token_verifier,
        order_repository,
        catalog_repository,
        profile_repository,
        recommendation_engine,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let addr = std::env::var("API_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
