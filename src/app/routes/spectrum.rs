//! Spectrum routes: FFT analysis of one series, or cross-spectral analysis of two.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::app::error::ApiJson;
use crate::app::AppState;
use crate::domain::model::{DiagnosticReport, SpectrumRequest};
use crate::utils::error::Result;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/demo", get(demo))
        .route("/debug", get(debug))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "alive",
        "module": "spectral_sonification",
        "description": "Fourier transform and frequency extraction",
        "r_script_exists": state.scripts.spectrum.is_file(),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SpectrumRequest>,
) -> Result<Json<Value>> {
    tracing::info!("Spectrum analysis requested");

    request.validate()?;
    let payload = request.to_payload()?;
    let data = state
        .gateway
        .invoke(&state.scripts.spectrum, Some(&payload))
        .await?;

    tracing::info!("✅ Returning spectral analysis data");
    Ok(Json(data))
}

async fn demo(State(state): State<AppState>) -> Result<Json<Value>> {
    tracing::info!("Demo spectrum analysis requested");

    let data = state.gateway.invoke(&state.scripts.spectrum, None).await?;

    tracing::info!("✅ Returning demo spectral analysis data");
    Ok(Json(data))
}

async fn debug(State(state): State<AppState>) -> Json<DiagnosticReport> {
    Json(state.diagnostics.diagnose(&state.scripts.spectrum).await)
}
