// handlers/system.rs - GET / and GET /health

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Blog API",
        "version": version,
        "description": "Blog backend with categories, posts and comments",
        "endpoints": {
            "token": "/api/token/, /api/token/refresh/ (public)",
            "categories": "/api/categories/[:id/]",
            "posts": "/api/posts/[:id/]",
            "comments": "/api/comments/[:id/]",
            "health": "/health"
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.maintenance.ping().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database temporarily unavailable"));
    }

    Ok(Json(json!({
        "status": "ok",
        "environment": state.config.environment,
        "store": state.config.database.backend,
    })))
}
