use axum::{extract::State, http::StatusCode, Json};

use crate::{metrics::LATENCY_METRIC, AppState};

// ── GET /api/metrics/latency ─────────────────────────────────────────────────

pub async fn latency_report(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let history = state.metrics.history().read().await;

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "namespace": state.metrics.namespace(),
            "service": state.metrics.service_name(),
            "metric": LATENCY_METRIC,
            "samples": history.len(),
            "summary": history.summary(),
        })),
    )
}
