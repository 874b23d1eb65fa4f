//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::order::{CreateOrderRequest, UpdateOrderStatusRequest},
    models::menu::{MenuQuery, NewMenuItem, UpdateMenuItem},
    models::{Role, UpdateStudentProfile, UpdateVendorProfile},
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Order ledger
        .route(
            "/api/orders/student",
            post(create_order).get(get_student_orders),
        )
        .route("/api/orders/student/:order_id", get(get_student_order))
        .route(
            "/api/orders/student/:order_id/trackstatus",
            get(track_order_status),
        )
        .route(
            "/api/orders/student/:order_id/cancel",
            patch(cancel_order_as_student),
        )
        .route("/api/orders/vendor", get(get_vendor_orders))
        .route("/api/orders/vendor/:order_id", get(get_vendor_order))
        .route(
            "/api/orders/vendor/:order_id/status",
            patch(update_order_status),
        )
        .route(
            "/api/orders/vendor/:order_id/cancel",
            patch(cancel_order_as_vendor),
        )
        // Student browsing and profile
        .route(
            "/api/students/me",
            get(get_student_me).patch(update_student_me),
        )
        .route("/api/students/menus", get(get_all_menus))
        .route(
            "/api/students/vendors/:vendor_id/menus",
            get(get_vendor_menus_for_student),
        )
        .route("/api/students/menus/:menu_id", get(get_menu_for_student))
        .route("/api/students/recommendations", get(get_recommendations))
        // Vendor catalog and profile
        .route("/api/vendors/me", get(get_vendor_me).patch(update_vendor_me))
        .route(
            "/api/vendors/menus",
            post(create_menu_item).get(get_vendor_menu_list),
        )
        .route(
            "/api/vendors/menus/:menu_id",
            get(get_vendor_menu_item)
                .patch(update_menu_item)
                .delete(delete_menu_item),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/categories", get(get_categories))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    common::database::health_check(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({
        "status": "success",
        "message": "CampusCrave API is running"
    })))
}

/// List all categories
pub async fn get_categories(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let categories = state.catalog_repository.list_categories().await?;

    Ok(Json(json!({
        "status": "success",
        "results": categories.len(),
        "data": { "categories": categories }
    })))
}

/// Create an order from the student's cart
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;

    if payload.items.is_empty() {
        return Err(ApiError::BadRequest(
            "Order must contain at least one item".to_string(),
        ));
    }
    if payload.delivery_location.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Missing required order fields".to_string(),
        ));
    }
    if payload.items.iter().any(|item| item.quantity <= 0) {
        return Err(ApiError::BadRequest(
            "Item quantity must be a positive integer".to_string(),
        ));
    }

    let order = state
        .order_repository
        .create_order(user.id, &payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": order
        })),
    ))
}

/// List the student's own orders
pub async fn get_student_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;

    let orders = state.order_repository.list_for_student(user.id).await?;

    Ok(Json(json!({
        "status": "success",
        "results": orders.len(),
        "data": orders
    })))
}

/// Get one of the student's own orders
pub async fn get_student_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;

    let order = state
        .order_repository
        .find_for_student(order_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": order
    })))
}

/// Minimal status projection of the student's own order
pub async fn track_order_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;

    let order = state
        .order_repository
        .track_status(order_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "order": order }
    })))
}

/// List the vendor's received orders
pub async fn get_vendor_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;

    let orders = state.order_repository.list_for_vendor(user.id).await?;

    Ok(Json(json!({
        "status": "success",
        "results": orders.len(),
        "data": orders
    })))
}

/// Get one of the vendor's received orders
pub async fn get_vendor_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;

    let order = state
        .order_repository
        .find_for_vendor(order_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": order
    })))
}

/// Vendor-driven status advance
pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;

    let order = state
        .order_repository
        .update_status(order_id, user.id, payload.status)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": order
    })))
}

/// Cancel the student's own order
pub async fn cancel_order_as_student(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;
    cancel_order(state, user, order_id).await
}

/// Cancel an order received by the vendor
pub async fn cancel_order_as_vendor(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;
    cancel_order(state, user, order_id).await
}

async fn cancel_order(
    state: AppState,
    user: AuthUser,
    order_id: Uuid,
) -> ApiResult<impl IntoResponse> {
    let order = state
        .order_repository
        .cancel(order_id, user.id, user.role)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": order
    })))
}

/// Ranked menu recommendations for the student
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;

    let menus = state.recommendation_engine.recommend(user.id).await?;

    Ok(Json(json!({
        "status": "success",
        "results": menus.len(),
        "data": { "menus": menus }
    })))
}

/// Get the logged-in student's profile
pub async fn get_student_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;

    let student = state
        .profile_repository
        .find_student(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "student": student }
    })))
}

/// Update the logged-in student's profile
pub async fn update_student_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateStudentProfile>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;

    let student = state
        .profile_repository
        .update_student(user.id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "student": student }
    })))
}

/// All available menus, for browsing
pub async fn get_all_menus(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;

    let menus = state.catalog_repository.list_available().await?;

    Ok(Json(json!({
        "status": "success",
        "results": menus.len(),
        "data": { "menus": menus }
    })))
}

/// One vendor's available menus, optionally filtered by category
pub async fn get_vendor_menus_for_student(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(vendor_id): Path<Uuid>,
    Query(query): Query<MenuQuery>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;

    let menus = state
        .catalog_repository
        .list_vendor_available(vendor_id, query.category_id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": menus.len(),
        "data": { "menus": menus }
    })))
}

/// One available menu item with vendor and category
pub async fn get_menu_for_student(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(menu_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Student)?;

    let menu = state
        .catalog_repository
        .find_available(menu_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Menu item not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "menu": menu }
    })))
}

/// Get the logged-in vendor's profile
pub async fn get_vendor_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;

    let vendor = state
        .profile_repository
        .find_vendor(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vendor not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "vendor": vendor }
    })))
}

/// Update the logged-in vendor's profile
pub async fn update_vendor_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateVendorProfile>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;

    let vendor = state
        .profile_repository
        .update_vendor(user.id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vendor not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "vendor": vendor }
    })))
}

/// Create a menu item owned by the logged-in vendor
pub async fn create_menu_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewMenuItem>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Name, price, and categoryId are required".to_string(),
        ));
    }
    if payload.price <= 0 {
        return Err(ApiError::BadRequest(
            "Price must be a positive amount".to_string(),
        ));
    }

    let menu = state
        .catalog_repository
        .create_menu_item(user.id, &payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": { "menu": menu }
        })),
    ))
}

/// List the logged-in vendor's menu items
pub async fn get_vendor_menu_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;

    let menus = state.catalog_repository.list_vendor_menu(user.id).await?;

    Ok(Json(json!({
        "status": "success",
        "results": menus.len(),
        "data": { "menus": menus }
    })))
}

/// Get one of the logged-in vendor's menu items
pub async fn get_vendor_menu_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(menu_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;

    let menu = state
        .catalog_repository
        .find_vendor_menu_item(menu_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Menu item not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "menu": menu }
    })))
}

/// Update one of the logged-in vendor's menu items
pub async fn update_menu_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(menu_id): Path<Uuid>,
    Json(payload): Json<UpdateMenuItem>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;

    if let Some(price) = payload.price {
        if price <= 0 {
            return Err(ApiError::BadRequest(
                "Price must be a positive amount".to_string(),
            ));
        }
    }

    let menu = state
        .catalog_repository
        .update_menu_item(menu_id, user.id, &payload)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Menu item not found or unauthorized".to_string())
        })?;

    Ok(Json(json!({
        "status": "success",
        "data": { "menu": menu }
    })))
}

/// Delete one of the logged-in vendor's menu items
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(menu_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require(Role::Vendor)?;

    let deleted = state
        .catalog_repository
        .delete_menu_item(menu_id, user.id)
        .await?;

    if !deleted {
        return Err(ApiError::NotFound(
            "Menu item not found or unauthorized".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
