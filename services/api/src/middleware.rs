//! Authentication middleware for JWT token validation

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;

use crate::{error::ApiError, models::Role, state::AppState};

/// JWT claims structure, mirroring what the auth service issues
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Principal ID
    pub sub: Uuid,
    /// Principal role
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Verifier for tokens issued by the auth service
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a new TokenVerifier from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Shared signing secret (required)
    pub fn from_env() -> Result<Self, String> {
        let secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET environment variable not set")?;

        let mut validation = Validation::default();
        validation.validate_exp = true;

        Ok(TokenVerifier {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Validate a token and return the claims
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

/// Authenticated principal attached to the request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Check that the principal carries the given role
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role != role {
            return Err(ApiError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ));
        }

        Ok(())
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract the Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("You are not logged in".to_string()))?;

    // Check if it's a Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("You are not logged in".to_string()))?;

    // Validate the token
    let claims = state
        .token_verifier
        .verify(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    let user = AuthUser {
        id: claims.sub,
        role: claims.role,
    };

    // Insert the user into the request extensions
    req.extensions_mut().insert(user);

    // Call the next service
    let response = next.run(req).await;

    Ok(response)
}
