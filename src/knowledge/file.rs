//! JSON-file knowledge store.
//!
//! Persists facts to `{working_dir}/.flux/knowledge.json` as a JSON array.
//! Reads are served from memory; every write rewrites the file under an
//! exclusive lock so several processes sharing a working directory do not
//! interleave partial writes.

use async_trait::async_trait;
use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::{prepare_fact, KnowledgeError, KnowledgeFact, KnowledgeStore};

#[derive(Debug)]
pub struct FileKnowledgeStore {
    facts: RwLock<Vec<KnowledgeFact>>,
    storage_path: PathBuf,
}

impl FileKnowledgeStore {
    /// Open the store, loading existing facts if the file exists.
    ///
    /// An unreadable file is logged and treated as empty; it is overwritten on
    /// the next successful write.
    pub async fn open(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();

        let facts = if storage_path.exists() {
            match Self::load_from_path(&storage_path) {
                Ok(facts) => {
                    tracing::info!(
                        "Loaded {} knowledge facts from {}",
                        facts.len(),
                        storage_path.display()
                    );
                    facts
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load knowledge from {}: {}, starting empty",
                        storage_path.display(),
                        e
                    );
                    Vec::new()
                }
            }
        } else {
            tracing::info!(
                "No knowledge file at {}, starting empty",
                storage_path.display()
            );
            Vec::new()
        };

        Self {
            facts: RwLock::new(facts),
            storage_path,
        }
    }

    fn load_from_path(path: &Path) -> Result<Vec<KnowledgeFact>, KnowledgeError> {
        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write `facts` on the blocking pool so a contended file lock does not
    /// stall a runtime worker.
    async fn persist(&self, facts: Vec<KnowledgeFact>) -> Result<(), KnowledgeError> {
        let path = self.storage_path.clone();
        tokio::task::spawn_blocking(move || save_to_disk(&path, &facts))
            .await
            .map_err(|e| KnowledgeError::Io(std::io::Error::other(e)))?
    }
}

fn save_to_disk(storage_path: &Path, facts: &[KnowledgeFact]) -> Result<(), KnowledgeError> {
    if let Some(parent) = storage_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let lock_path = storage_path.with_extension("json.lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;
    lock_file.lock_exclusive()?;

    let contents = serde_json::to_string_pretty(facts)?;
    let tmp_path = storage_path.with_extension("json.tmp");
    let written = std::fs::write(&tmp_path, contents)
        .and_then(|_| std::fs::rename(&tmp_path, storage_path));

    lock_file.unlock()?;
    written?;

    tracing::debug!("Saved knowledge to {}", storage_path.display());
    Ok(())
}

#[async_trait]
impl KnowledgeStore for FileKnowledgeStore {
    async fn facts(&self) -> Result<Vec<KnowledgeFact>, KnowledgeError> {
        Ok(self.facts.read().await.clone())
    }

    async fn append(&self, fact: &str) -> Result<KnowledgeFact, KnowledgeError> {
        let mut facts = self.facts.write().await;
        let record = prepare_fact(&facts, fact)?;

        let mut updated = facts.clone();
        updated.push(record.clone());
        self.persist(updated.clone()).await?;
        *facts = updated;

        Ok(record)
    }

    async fn remove(&self, id: &str) -> Result<(), KnowledgeError> {
        let mut facts = self.facts.write().await;
        if !facts.iter().any(|f| f.id == id) {
            return Err(KnowledgeError::NotFound(id.to_string()));
        }

        let updated: Vec<KnowledgeFact> = facts.iter().filter(|f| f.id != id).cloned().collect();
        self.persist(updated.clone()).await?;
        *facts = updated;

        Ok(())
    }
}
