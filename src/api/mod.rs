//! HTTP API.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/tasks/execute` - Run the tool-calling loop for a task
//! - `POST /api/brain-dump` - Coach a brain dump into a plan
//! - `POST /api/parse` - Turn free text into tasks
//! - `GET /api/knowledge` - List learned facts
//! - `POST /api/knowledge` - Add a fact
//! - `DELETE /api/knowledge/:id` - Remove a fact

mod knowledge;
mod routes;
pub mod types;

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::agent::Agent;
use crate::config::{Config, KnowledgeBackend};
use crate::knowledge::{FileKnowledgeStore, InMemoryKnowledgeStore, KnowledgeStore, KnowledgeWriter};

pub use routes::{router, AppState};

/// Open the configured knowledge backend.
pub async fn open_knowledge_store(config: &Config) -> Arc<dyn KnowledgeStore> {
    match config.knowledge_backend {
        KnowledgeBackend::File => Arc::new(FileKnowledgeStore::open(config.knowledge_path()).await),
        KnowledgeBackend::Memory => Arc::new(InMemoryKnowledgeStore::new()),
    }
}

/// Start the HTTP server and run until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    if config.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; model calls will return fallback messages");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    let agent = Agent::new(&config);
    run_until(listener, &config, agent, shutdown_signal()).await
}

/// Serve on `listener` until `shutdown` resolves, then drain queued facts.
async fn run_until<F>(
    listener: TcpListener,
    config: &Config,
    agent: Agent,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let knowledge = open_knowledge_store(config).await;
    let (facts, writer_task) = KnowledgeWriter::spawn(knowledge.clone());

    let state = Arc::new(AppState {
        agent: Arc::new(agent),
        knowledge,
        facts,
    });

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    // The router held the last writer handle; let queued facts drain.
    if let Err(e) = writer_task.await {
        tracing::warn!("Knowledge writer ended abnormally: {}", e);
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
