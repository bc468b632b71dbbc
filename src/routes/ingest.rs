use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::info;

use crate::models::AppState;
use crate::rag::IngestReport;
use crate::types::{AppError, AppResult};

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ingest", post(ingest))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

fn is_pdf(content_type: Option<&str>, file_name: &str) -> bool {
    let declared_pdf = content_type
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .map(|m| m.essence_str() == mime::APPLICATION_PDF.essence_str())
        .unwrap_or(false);
    declared_pdf || file_name.to_lowercase().ends_with(".pdf")
}

pub async fn ingest(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<IngestReport>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
        if !is_pdf(field.content_type(), &file_name) {
            return Err(AppError::InvalidRequest(format!("{} is not a PDF", file_name)));
        }

        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        info!(file = %file_name, size = content.len(), "Received PDF upload");

        let report = state.ingestor.ingest_bytes(content, &file_name).await?;
        return Ok(Json(report));
    }

    Err(AppError::InvalidRequest("multipart field 'file' is required".to_string()))
}
