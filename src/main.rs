use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use veritas_rag::{
    client::VeritasClient,
    config::{Config, GraphBackend, VectorBackend},
    routes::create_router,
    utils::init_logger,
    AppState,
};

#[derive(Parser)]
#[command(name = "veritas", version, about = "Hybrid graph + vector RAG over PDF documents")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Ingest a PDF into the vector and graph stores
    Ingest {
        #[arg(default_value = "manual.pdf")]
        path: PathBuf,
    },
    /// Ask a running server a question
    Ask {
        question: String,
        #[arg(long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        // The ask client talks to a remote server and needs no backend configuration
        Command::Ask { question, url } => ask(&url, &question).await,
        Command::Serve => {
            let (config, _log_guard) = setup()?;
            serve(config).await
        }
        Command::Ingest { path } => {
            let (config, _log_guard) = setup()?;
            ingest(config, path).await
        }
    }
}

fn setup() -> anyhow::Result<(Config, Option<WorkerGuard>)> {
    let config = Config::from_env()?;
    let guard = init_logger(&config.logging);
    info!("Configuration loaded: {:?}", config.server);
    Ok((config, guard))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config.clone()).await?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn ingest(config: Config, path: PathBuf) -> anyhow::Result<()> {
    if !path.exists() {
        return Err(anyhow!("Could not find '{}'. Please check the file name is exact.", path.display()));
    }
    if config.vector_store.backend == VectorBackend::Memory || config.graph_store.backend == GraphBackend::Memory {
        warn!("In-memory stores are discarded when this command exits; use `serve` and POST /ingest instead");
    }

    info!(path = %path.display(), "Found document, starting ingestion");
    let state = AppState::from_config(config).await?;
    let report = state.ingestor.ingest_pdf(&path).await?;
    info!(document = %report.document, pages = report.pages, chunks = report.chunks, "Ingestion complete");
    Ok(())
}

async fn ask(url: &str, question: &str) -> anyhow::Result<()> {
    println!("Asking Veritas: '{}'...", question);
    let answer = VeritasClient::new(url).ask(question).await?;

    let rule = "=".repeat(50);
    println!("\n{rule}\nVERITAS ANSWER:\n{rule}\n{}\n\n{rule}", answer.answer);
    println!("Sources used: {}", serde_json::to_string(&answer.sources)?);
    Ok(())
}
