//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::agent::{ExecutionFailure, ExecutionReport, HistoryEntry, UserProfile};
use crate::llm::GeoLocation;
use crate::task::Task;

/// Request to execute a task.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteTaskRequest {
    /// The task to carry out
    pub task: Task,

    /// Optional free-text instruction (defaults to the task title)
    #[serde(default)]
    pub instruction: Option<String>,

    /// Prior conversation turns, oldest first
    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    #[serde(default)]
    pub profile: UserProfile,

    /// Location already resolved by the caller
    #[serde(default)]
    pub location: Option<GeoLocation>,
}

/// Result of a task execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteTaskResponse {
    /// Text to show the user
    pub result: String,

    /// Tool-dispatch rounds performed
    pub rounds: usize,

    /// True when the round cap stopped pending tool calls
    pub truncated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExecutionFailure>,
}

impl From<ExecutionReport> for ExecuteTaskResponse {
    fn from(report: ExecutionReport) -> Self {
        Self {
            result: report.text,
            rounds: report.rounds,
            truncated: report.truncated,
            failure: report.failure,
        }
    }
}

/// Brain-dump conversation to analyze.
#[derive(Debug, Clone, Deserialize)]
pub struct BrainDumpRequest {
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub profile: UserProfile,
}

/// Free text to turn into tasks.
#[derive(Debug, Clone, Deserialize)]
pub struct ParseInputRequest {
    pub input: String,
    #[serde(default)]
    pub profile: UserProfile,
}

/// Request to store a fact.
#[derive(Debug, Clone, Deserialize)]
pub struct AddKnowledgeRequest {
    pub fact: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
