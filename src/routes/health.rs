use axum::{extract::State, routing::get, Json, Router};
use tracing::warn;

use crate::models::{AppState, HealthResponse};
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}

fn describe(store: &str, result: &AppResult<()>) -> String {
    match result {
        Ok(()) => format!("{}: connected", store),
        Err(e) => {
            warn!(store, error = %e, "Health check failed");
            format!("{}: unavailable ({})", store, e)
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let vector_store = state.pipeline.vector_store();
    let graph_store = state.pipeline.graph_store();

    let (vector, graph) = tokio::join!(vector_store.health_check(), graph_store.health_check());
    let status = if vector.is_ok() && graph.is_ok() { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        vector_store: describe(vector_store.name(), &vector),
        graph_store: describe(graph_store.name(), &graph),
    })
}
