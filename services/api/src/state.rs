//! Application state shared across handlers

use sqlx::PgPool;

use crate::middleware::TokenVerifier;
use crate::recommendation::RecommendationEngine;
use crate::repositories::{CatalogRepository, OrderRepository, ProfileRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub token_verifier: TokenVerifier,
    pub order_repository: OrderRepository,
    pub catalog_repository: CatalogRepository,
    pub profile_repository: ProfileRepository,
    pub recommendation_engine: RecommendationEngine,
}
