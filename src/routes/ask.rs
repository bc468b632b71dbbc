use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::models::{AppState, AskRequest};
use crate::rag::Answer;
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .with_state(state)
}

pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> AppResult<Json<Answer>> {
    info!(query = %request.query, "Thinking about question");
    let answer = state.pipeline.ask(&request.query).await?;
    Ok(Json(answer))
}
