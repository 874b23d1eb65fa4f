//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    models::{NewStudent, NewVendor, Role},
    validation,
};

/// Request for student registration
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStudentRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub phone: String,
}

/// Request for vendor registration
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVendorRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub location: String,
}

/// Request for login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public user fields returned after login
#[derive(Serialize)]
pub struct LoginUser {
    pub id: uuid::Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/student/register", post(register_student))
        .route("/auth/vendor/register", post(register_vendor))
        .route("/auth/login", post(login))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> AuthResult<impl IntoResponse> {
    common::database::health_check(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            AuthError::Internal
        })?;

    Ok(Json(json!({
        "status": "success",
        "message": "CampusCrave API is running"
    })))
}

/// Student registration endpoint
pub async fn register_student(
    State(state): State<AppState>,
    Json(payload): Json<RegisterStudentRequest>,
) -> AuthResult<impl IntoResponse> {
    validation::validate_email(&payload.email).map_err(AuthError::BadRequest)?;
    validation::validate_campus_email(&payload.email).map_err(AuthError::BadRequest)?;
    validation::validate_password(&payload.password).map_err(AuthError::BadRequest)?;
    validation::validate_required("Name", &payload.name).map_err(AuthError::BadRequest)?;
    validation::validate_required("Phone", &payload.phone).map_err(AuthError::BadRequest)?;

    if payload.password != payload.confirm_password {
        return Err(AuthError::BadRequest("Passwords do not match".to_string()));
    }

    let new_student = NewStudent {
        email: payload.email,
        password: payload.password,
        name: payload.name,
        phone: payload.phone,
    };

    let student = state
        .identity_repository
        .create_student(&new_student)
        .await?
        .ok_or_else(|| AuthError::Conflict("Email already registered".to_string()))?;

    info!("Student registered: {}", student.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Student registered successfully.",
            "data": {
                "student": {
                    "id": student.id,
                    "email": student.email,
                    "name": student.name,
                    "phone": student.phone,
                    "role": Role::Student,
                    "createdAt": student.created_at,
                }
            }
        })),
    ))
}

/// Vendor registration endpoint
pub async fn register_vendor(
    State(state): State<AppState>,
    Json(payload): Json<RegisterVendorRequest>,
) -> AuthResult<impl IntoResponse> {
    validation::validate_email(&payload.email).map_err(AuthError::BadRequest)?;
    validation::validate_password(&payload.password).map_err(AuthError::BadRequest)?;
    validation::validate_required("Name", &payload.name).map_err(AuthError::BadRequest)?;
    validation::validate_required("Location", &payload.location).map_err(AuthError::BadRequest)?;

    let new_vendor = NewVendor {
        email: payload.email,
        password: payload.password,
        name: payload.name,
        phone: payload.phone,
        location: payload.location,
    };

    let vendor = state
        .identity_repository
        .create_vendor(&new_vendor)
        .await?
        .ok_or_else(|| AuthError::Conflict("Email already registered".to_string()))?;

    info!("Vendor registered: {}", vendor.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Vendor registered successfully.",
            "data": {
                "vendor": {
                    "id": vendor.id,
                    "email": vendor.email,
                    "name": vendor.name,
                    "location": vendor.location,
                }
            }
        })),
    ))
}

/// Login endpoint for all principal kinds
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    // Unknown email and wrong password are indistinguishable to the caller
    let principal = state
        .identity_repository
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AuthError::Unauthorized("Invalid email or password".to_string()))?;

    let password_ok = state
        .identity_repository
        .verify_password(principal.password_hash(), &payload.password)?;

    if !password_ok {
        return Err(AuthError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = state
        .jwt_service
        .sign_token(principal.id(), principal.role())
        .map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            AuthError::Internal
        })?;

    info!("Login successful for {} {}", principal.role(), principal.id());

    let user = LoginUser {
        id: principal.id(),
        email: principal.email().to_string(),
        name: principal.name().to_string(),
        role: principal.role(),
    };

    Ok(Json(json!({
        "status": "success",
        "token": token,
        "data": { "user": user }
    })))
}
