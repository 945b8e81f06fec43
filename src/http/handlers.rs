use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::{AdminUser, AuthUser};
use super::requests::{CreateSweetRequest, Credentials, SearchParams, StockRequest, UpdateSweetRequest, ValidatedJson};
use crate::domain::aggregates::Product;
use crate::error::{ApiError, Result};
use crate::services::Summary;
use crate::state::AppState;

/// Ids that are not UUIDs cannot name a stored sweet.
fn sweet_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

// =============================================================================
// Auth
// =============================================================================

pub async fn register(
    State(s): State<AppState>,
    body: std::result::Result<ValidatedJson<Credentials>, ApiError>,
) -> Result<(StatusCode, Json<Value>)> {
    let ValidatedJson(creds) = body.map_err(|e| ApiError::Registration(e.to_string()))?;
    let username = creds.username().map_err(|e| ApiError::Registration(e.to_string()))?;
    s.accounts.register(username, &creds.password).await?;
    Ok((StatusCode::CREATED, Json(json!({ "message": "User created" }))))
}

/// Any unreadable or blank credentials answer like a failed lookup.
pub async fn login(
    State(s): State<AppState>,
    body: std::result::Result<ValidatedJson<Credentials>, ApiError>,
) -> Result<Json<Value>> {
    let ValidatedJson(creds) = body.map_err(|_| ApiError::InvalidCredentials)?;
    let token = s.accounts.login(creds.username.trim(), &creds.password).await?;
    Ok(Json(json!({ "token": token })))
}

// =============================================================================
// Catalog
// =============================================================================

pub async fn list_sweets(State(s): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(s.catalog.list_all().await?))
}

pub async fn get_sweet(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    Ok(Json(s.catalog.get_by_id(sweet_id(&id)?).await?))
}

pub async fn search_sweets(State(s): State<AppState>, Query(p): Query<SearchParams>) -> Result<Json<Vec<Product>>> {
    Ok(Json(s.catalog.search(&p.into_filter()?).await?))
}

pub async fn create_sweet(
    _admin: AdminUser,
    State(s): State<AppState>,
    ValidatedJson(r): ValidatedJson<CreateSweetRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = s.catalog.create(r.into_new_product()?).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_sweet(
    _admin: AdminUser,
    State(s): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(r): ValidatedJson<UpdateSweetRequest>,
) -> Result<Json<Product>> {
    let id = sweet_id(&id)?;
    Ok(Json(s.catalog.update(id, &r.into_patch()?).await?))
}

pub async fn delete_sweet(_admin: AdminUser, State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    s.catalog.delete(sweet_id(&id)?).await?;
    Ok(Json(json!({ "message": "Sweet deleted" })))
}

// =============================================================================
// Inventory
// =============================================================================

pub async fn purchase_sweet(
    AuthUser(claims): AuthUser,
    State(s): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(r): ValidatedJson<StockRequest>,
) -> Result<Json<Value>> {
    let id = sweet_id(&id)?;
    let purchase = s.inventory.purchase(id, Some(claims.id), r.quantity()?).await?;
    Ok(Json(json!({ "message": "Purchase successful", "quantity": purchase.remaining })))
}

pub async fn restock_sweet(
    _admin: AdminUser,
    State(s): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(r): ValidatedJson<StockRequest>,
) -> Result<Json<Value>> {
    let id = sweet_id(&id)?;
    let on_hand = s.inventory.restock(id, r.quantity()?).await?;
    Ok(Json(json!({ "message": "Restock successful", "quantity": on_hand })))
}

// =============================================================================
// Analytics
// =============================================================================

pub async fn admin_stats(_admin: AdminUser, State(s): State<AppState>) -> Result<Json<Summary>> {
    Ok(Json(s.analytics.summary().await?))
}
