//! Best-effort side channel for facts learned while answering.
//!
//! Callers record facts without waiting; a background task appends them to the
//! store. Failures are logged and never reach the caller.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{KnowledgeError, KnowledgeStore};

/// Cloneable handle for queueing learned facts.
#[derive(Clone)]
pub struct KnowledgeWriter {
    tx: mpsc::UnboundedSender<String>,
}

impl KnowledgeWriter {
    /// Start the background task draining into `store`.
    ///
    /// The task ends once every handle is dropped and the queue is empty.
    pub fn spawn(store: Arc<dyn KnowledgeStore>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let handle = tokio::spawn(async move {
            while let Some(first) = rx.recv().await {
                let mut batch = vec![first];
                while let Ok(next) = rx.try_recv() {
                    batch.push(next);
                }

                for fact in batch {
                    match store.append(&fact).await {
                        Ok(stored) => tracing::info!("Learned: {}", stored.fact),
                        Err(KnowledgeError::Duplicate) | Err(KnowledgeError::Empty) => {
                            tracing::debug!("Skipping known or empty fact: {:?}", fact)
                        }
                        Err(e) => tracing::warn!("Failed to store learned fact: {}", e),
                    }
                }
            }
            tracing::debug!("Knowledge writer stopped");
        });

        (Self { tx }, handle)
    }

    /// Queue one fact.
    pub fn record(&self, fact: impl Into<String>) {
        if self.tx.send(fact.into()).is_err() {
            tracing::warn!("Knowledge writer is gone; dropping learned fact");
        }
    }

    /// Queue several facts in order.
    pub fn record_all<I, S>(&self, facts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for fact in facts {
            self.record(fact);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::InMemoryKnowledgeStore;

    #[tokio::test]
    async fn queued_facts_are_appended_in_order() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let (writer, handle) = KnowledgeWriter::spawn(store.clone());

        writer.record_all(["Has two kids", "has two kids", "", "Coaches soccer"]);
        drop(writer);
        handle.await.expect("writer task");

        assert_eq!(
            store.context_text().await,
            "- Has two kids\n- Coaches soccer"
        );
    }

    #[tokio::test]
    async fn record_after_shutdown_does_not_panic() {
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let (writer, handle) = KnowledgeWriter::spawn(store);
        handle.abort();
        let _ = handle.await;
        writer.record("ignored");
    }
}
