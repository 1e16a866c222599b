//! In-memory knowledge store (non-persistent).

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{prepare_fact, KnowledgeError, KnowledgeFact, KnowledgeStore};

#[derive(Clone, Default)]
pub struct InMemoryKnowledgeStore {
    facts: Arc<RwLock<Vec<KnowledgeFact>>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with facts, skipping empty and duplicate entries.
    pub fn with_facts<I, S>(facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stored = Vec::new();
        for fact in facts {
            if let Ok(record) = prepare_fact(&stored, fact.as_ref()) {
                stored.push(record);
            }
        }
        Self {
            facts: Arc::new(RwLock::new(stored)),
        }
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn facts(&self) -> Result<Vec<KnowledgeFact>, KnowledgeError> {
        Ok(self.facts.read().await.clone())
    }

    async fn append(&self, fact: &str) -> Result<KnowledgeFact, KnowledgeError> {
        let mut facts = self.facts.write().await;
        let record = prepare_fact(&facts, fact)?;
        facts.push(record.clone());
        Ok(record)
    }

    async fn remove(&self, id: &str) -> Result<(), KnowledgeError> {
        let mut facts = self.facts.write().await;
        let before = facts.len();
        facts.retain(|f| f.id != id);
        if facts.len() == before {
            return Err(KnowledgeError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::NO_KNOWLEDGE_TEXT;

    #[tokio::test]
    async fn append_rejects_duplicates_and_empty() {
        let store = InMemoryKnowledgeStore::new();
        store.append("Lives in Berlin").await.expect("first append");

        assert!(matches!(
            store.append("lives in berlin").await,
            Err(KnowledgeError::Duplicate)
        ));
        assert!(matches!(store.append("").await, Err(KnowledgeError::Empty)));
        assert_eq!(store.facts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_deletes_by_id() {
        let store = InMemoryKnowledgeStore::new();
        let fact = store.append("Drinks tea").await.unwrap();
        store.remove(&fact.id).await.expect("remove");
        assert_eq!(store.context_text().await, NO_KNOWLEDGE_TEXT);
        assert!(matches!(
            store.remove(&fact.id).await,
            Err(KnowledgeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn with_facts_keeps_first_seen_order() {
        let store = InMemoryKnowledgeStore::with_facts(["B", "a", "b", " "]);
        assert_eq!(store.context_text().await, "- B\n- a");
    }
}
