//! Knowledge store: learned facts about the user.
//!
//! Facts personalize prompts. The store is append-only from the agent's point
//! of view; the API may also delete facts. Stores are passed to the agent
//! explicitly, never reached through a global.

mod file;
mod memory;
mod writer;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileKnowledgeStore;
pub use memory::InMemoryKnowledgeStore;
pub use writer::KnowledgeWriter;

/// Text used in prompts when nothing has been learned yet.
pub const NO_KNOWLEDGE_TEXT: &str = "No specific user knowledge yet.";

/// A single learned fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeFact {
    pub id: String,
    pub fact: String,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeFact {
    fn new(fact: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            fact,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Fact cannot be empty")]
    Empty,

    #[error("This fact already exists")]
    Duplicate,

    #[error("Fact {0} not found")]
    NotFound(String),

    #[error("knowledge file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("knowledge file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Backend holding learned facts.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// All facts, oldest first.
    async fn facts(&self) -> Result<Vec<KnowledgeFact>, KnowledgeError>;

    /// Store a new fact. Input is trimmed; empty input and case-insensitive
    /// duplicates are rejected.
    async fn append(&self, fact: &str) -> Result<KnowledgeFact, KnowledgeError>;

    /// Delete a fact by id.
    async fn remove(&self, id: &str) -> Result<(), KnowledgeError>;

    /// Facts formatted as a bullet list for prompts.
    ///
    /// Read failures are logged and reported as "no knowledge".
    async fn context_text(&self) -> String {
        match self.facts().await {
            Ok(facts) => format_context(&facts),
            Err(e) => {
                tracing::error!("Failed to read knowledge: {}", e);
                NO_KNOWLEDGE_TEXT.to_string()
            }
        }
    }
}

fn format_context(facts: &[KnowledgeFact]) -> String {
    if facts.is_empty() {
        return NO_KNOWLEDGE_TEXT.to_string();
    }
    facts
        .iter()
        .map(|f| format!("- {}", f.fact))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate `fact` against `existing` and build the record to store.
fn prepare_fact(existing: &[KnowledgeFact], fact: &str) -> Result<KnowledgeFact, KnowledgeError> {
    let normalized = fact.trim();
    if normalized.is_empty() {
        return Err(KnowledgeError::Empty);
    }
    let lowered = normalized.to_lowercase();
    if existing.iter().any(|f| f.fact.to_lowercase() == lowered) {
        return Err(KnowledgeError::Duplicate);
    }
    Ok(KnowledgeFact::new(normalized.to_string()))
}
