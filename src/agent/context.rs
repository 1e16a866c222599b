//! Per-invocation inputs for the agent.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::knowledge::KnowledgeStore;
use crate::llm::{Content, GeoLocation, Role};
use crate::task::Task;
use crate::tools::ToolContext;

/// Identity the agent acts on behalf of.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl UserProfile {
    pub(crate) fn tool_context(&self) -> ToolContext {
        ToolContext {
            user_name: self.name.clone(),
            user_email: self.email.clone(),
        }
    }

    pub(crate) fn bio_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.bio
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(fallback)
    }
}

/// Speaker of a caller-supplied history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    #[serde(alias = "model")]
    Ai,
}

/// One prior turn of a conversation, as the caller stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    #[serde(alias = "text")]
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Ai,
            content: content.into(),
        }
    }
}

/// Convert caller history into provider turns, preserving order.
pub(crate) fn history_to_contents(history: &[HistoryEntry]) -> Vec<Content> {
    history
        .iter()
        .map(|entry| {
            let role = match entry.role {
                HistoryRole::User => Role::User,
                HistoryRole::Ai => Role::Model,
            };
            Content::text(role, entry.content.clone())
        })
        .collect()
}

/// Everything one `execute` call needs. Discarded when the call returns.
pub struct ExecutionContext<'a> {
    pub task: &'a Task,
    /// Free-text instruction; a default is synthesized from the task title when absent.
    pub instruction: Option<&'a str>,
    pub history: &'a [HistoryEntry],
    pub profile: &'a UserProfile,
    /// Biases web/maps retrieval when present.
    pub location: Option<GeoLocation>,
    pub knowledge: &'a dyn KnowledgeStore,
}

/// How long callers usually wait for a device location before giving up.
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(3);

/// Await a caller-side location lookup for at most `timeout`.
///
/// Failures and timeouts are logged and yield `None`.
pub async fn resolve_location<F, E>(lookup: F, timeout: Duration) -> Option<GeoLocation>
where
    F: Future<Output = Result<GeoLocation, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(location)) => Some(location),
        Ok(Err(e)) => {
            tracing::warn!("Location lookup failed: {}", e);
            None
        }
        Err(_) => {
            tracing::warn!("Location lookup timed out after {:?}", timeout);
            None
        }
    }
}
