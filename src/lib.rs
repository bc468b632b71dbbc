// Veritas - hybrid graph + vector retrieval-augmented question answering

pub mod client;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod graph;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod rag;
pub mod routes;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
