//! Iris routes: Fisher's 1936 dataset rendered as waves by the iris script.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::domain::model::{DiagnosticReport, InterpreterProbe};
use crate::utils::error::Result;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/test", get(test_interpreter))
        .route("/debug", get(debug))
        .route("/data", get(data))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "alive",
        "dataset": "iris",
        "year": 1936,
        "author": "R.A. Fisher",
        "r_script_exists": state.scripts.iris.is_file(),
    }))
}

async fn test_interpreter(State(state): State<AppState>) -> Json<InterpreterProbe> {
    Json(state.diagnostics.probe_interpreter().await)
}

async fn debug(State(state): State<AppState>) -> Json<DiagnosticReport> {
    Json(state.diagnostics.diagnose(&state.scripts.iris).await)
}

async fn data(State(state): State<AppState>) -> Result<Json<Value>> {
    tracing::info!("Iris data requested - script path: {}", state.scripts.iris.display());

    let data = state.gateway.invoke(&state.scripts.iris, None).await?;

    tracing::info!("✅ Returning iris transformation data");
    Ok(Json(data))
}
