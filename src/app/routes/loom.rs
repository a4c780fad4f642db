//! Loom routes: generative mathematical systems (attractors, automata, spirals).

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::app::error::ApiJson;
use crate::app::AppState;
use crate::domain::catalog::system_catalog;
use crate::domain::model::{DiagnosticReport, LoomRequest, LoomSystem};
use crate::utils::error::Result;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .route("/demo", get(demo))
        .route("/systems", get(systems))
        .route("/debug", get(debug))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "alive",
        "module": "loom",
        "description": "Generative mathematical sonification engine",
        "systems": LoomSystem::names(),
        "r_script_exists": state.scripts.loom.is_file(),
    }))
}

async fn generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoomRequest>,
) -> Result<Json<Value>> {
    tracing::info!("Loom generation requested: {}", request.system);

    // 未知的系統在呼叫腳本前就拒絕
    let payload = request.to_payload()?;
    let data = state
        .gateway
        .invoke(&state.scripts.loom, Some(&payload))
        .await?;

    tracing::info!("✅ Returning {} data", request.system);
    Ok(Json(data))
}

/// 無輸入時腳本以 Lorenz 吸引子作為預設
async fn demo(State(state): State<AppState>) -> Result<Json<Value>> {
    tracing::info!("Demo loom generation requested");

    let data = state.gateway.invoke(&state.scripts.loom, None).await?;

    tracing::info!("✅ Returning demo loom data");
    Ok(Json(data))
}

async fn systems() -> Json<Value> {
    Json(json!({ "systems": system_catalog() }))
}

async fn debug(State(state): State<AppState>) -> Json<DiagnosticReport> {
    Json(state.diagnostics.diagnose(&state.scripts.loom).await)
}
