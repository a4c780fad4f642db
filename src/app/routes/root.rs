use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::app::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Confluence is breathing",
        "philosophy": "Where rivers meet. Where disciplines dissolve.",
        "status": "alive",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "heartbeat": true,
    }))
}
