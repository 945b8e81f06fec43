//! HTTP surface: `/api/auth/*` and `/api/sweets/*`.

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub mod extract;
pub mod handlers;
pub mod requests;

use handlers::*;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/sweets", get(list_sweets).post(create_sweet))
        .route("/sweets/search", get(search_sweets))
        .route("/sweets/admin/stats", get(admin_stats))
        .route("/sweets/:id", get(get_sweet).put(update_sweet).delete(delete_sweet))
        .route("/sweets/:id/purchase", post(purchase_sweet))
        .route("/sweets/:id/restock", post(restock_sweet));

    Router::new()
        .route("/", get(|| async { "API Running" }))
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "sweetshop"})) }))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
