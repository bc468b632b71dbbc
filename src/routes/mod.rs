//! API Routes
//!
//! - `POST /ask` - answer a question from the ingested document
//! - `POST /ingest` - upload and ingest a PDF
//! - `GET /health` - backend health
//! - `GET /` - browser chat widget

pub mod ask;
pub mod health;
pub mod ingest;
pub mod ui;

use axum::Router;
use crate::middleware::{apply_cors, apply_trace};
use crate::models::AppState;
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let allowed_origins = state.config.server.cors_allowed_origins.clone();

    let router = Router::new()
        .merge(ask::router(state.clone()))
        .merge(ingest::router(state.clone()))
        .merge(health::router(state))
        .merge(ui::router());

    apply_trace(apply_cors(router, &allowed_origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::embeddings::document_processor::tests::sample_pdf;
    use crate::embeddings::MemoryVectorStore;
    use crate::graph::{GraphStore, MemoryGraphStore};
    use crate::llm::LLM;
    use crate::models::Stores;
    use crate::rag::query::tests::{LetterEmbedder, RecordingAdapter};

    async fn app() -> (Router, Arc<MemoryGraphStore>) {
        let graph = Arc::new(MemoryGraphStore::new());
        graph
            .merge_chunk("manual/chunk_0", "Encoders stack self attention layers.")
            .await
            .unwrap();

        let stores = Stores {
            embedder: Arc::new(LetterEmbedder),
            vector_store: Arc::new(MemoryVectorStore::new()),
            graph_store: graph.clone(),
        };
        let llm = LLM::from_adapter(
            "recording",
            Box::new(RecordingAdapter {
                prompts: Arc::new(Mutex::new(Vec::new())),
            }),
        );
        let state = AppState::new(Config::in_memory(), stores, llm).unwrap();
        (create_router(state), graph)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ask_returns_answer_and_sources() {
        let (app, _) = app().await;
        let response = app
            .oneshot(
                Request::post("/ask")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"query":"How do encoders work?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["answer"], "grounded answer");
        assert_eq!(body["sources"]["keyword_used"], "encoders");
        assert_eq!(body["sources"]["graph_nodes"], 1);
        assert_eq!(body["sources"]["vector_chunks"], 0);
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_query() {
        let (app, _) = app().await;
        let response = app
            .oneshot(
                Request::post("/ask")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"query":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_health_reports_stores() {
        let (app, _) = app().await;
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["vector_store"], "memory: connected");
        assert_eq!(body["graph_store"], "memory: connected");
    }

    fn pdf_upload(pdf: &[u8]) -> Request<Body> {
        let boundary = "veritas-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"paper.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(pdf);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::post("/ingest")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_ingest_upload() {
        let (app, graph) = app().await;
        let pdf = sample_pdf(&["Decoders generate tokens"]);

        let response = app.oneshot(pdf_upload(&pdf)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let report = json_body(response).await;
        assert_eq!(report["document"], "paper");
        assert_eq!(report["pages"], 1);
        assert_eq!(graph.len().await, 2);
    }

    #[tokio::test]
    async fn test_ingest_blank_pdf_is_bad_request() {
        let (app, graph) = app().await;
        let response = app.oneshot(pdf_upload(&sample_pdf(&[""]))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("no extractable text"));
        assert_eq!(graph.len().await, 1);
    }

    #[tokio::test]
    async fn test_ingest_requires_file_field() {
        let (app, _) = app().await;
        let boundary = "veritas-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{boundary}--\r\n"
        );

        let response = app
            .oneshot(
                Request::post("/ingest")
                    .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_index_serves_chat_widget() {
        let (app, _) = app().await;
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("fetch('/ask'"));
    }
}
