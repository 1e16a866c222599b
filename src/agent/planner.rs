//! Planning flows: brain-dump coaching and free-text task capture.
//!
//! Both ask the model for structured JSON, turn drafts into [`Task`]s and
//! [`Project`]s with fresh ids, and pass any learned facts to the
//! [`KnowledgeWriter`]. Like execution, they never fail: errors become fixed
//! fallback values.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::knowledge::{KnowledgeStore, KnowledgeWriter};
use crate::llm::{Content, GenerateRequest, LlmError};
use crate::task::{new_id, EnergyCost, Project, ProjectStatus, Task, TaskCategory, TaskPriority, TaskStatus};

use super::agent_loop::Agent;
use super::context::{history_to_contents, HistoryEntry, UserProfile};
use super::prompt::{build_brain_dump_instruction, build_parse_instruction};

/// Collaborators shared by the planning flows.
pub struct PlanningContext<'a> {
    pub profile: &'a UserProfile,
    pub knowledge: &'a dyn KnowledgeStore,
    pub facts: &'a KnowledgeWriter,
}

/// Coach output for a brain dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrainDumpAnalysis {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub strategy: String,
    pub clarifying_questions: Vec<String>,
    /// True once the plan is actionable; false while the coach needs answers.
    pub is_complete: bool,
}

impl BrainDumpAnalysis {
    fn fallback(strategy: &str) -> Self {
        Self {
            tasks: Vec::new(),
            projects: Vec::new(),
            strategy: strategy.to_string(),
            clarifying_questions: Vec::new(),
            is_complete: true,
        }
    }
}

/// Tasks extracted from free text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInput {
    pub new_tasks: Vec<Task>,
    pub suggestions: String,
}

#[derive(Debug, Error)]
enum PlanningError {
    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("model returned no text")]
    Empty,

    #[error("model returned invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDraft {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    estimated_duration: f64,
    #[serde(default)]
    priority: TaskPriority,
    #[serde(default)]
    energy_cost: EnergyCost,
    #[serde(default)]
    category: TaskCategory,
    #[serde(default)]
    is_ai_generatable: bool,
    #[serde(default, rename = "autoExecuteWithAI")]
    auto_execute_with_ai: bool,
}

impl TaskDraft {
    fn into_task(self, project_id: Option<&str>) -> Task {
        Task {
            id: new_id(),
            title: self.title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            estimated_duration: self.estimated_duration.max(0.0).round() as u32,
            priority: self.priority,
            energy_cost: self.energy_cost,
            category: self.category,
            is_ai_generatable: self.is_ai_generatable,
            auto_execute_with_ai: self.auto_execute_with_ai,
            status: TaskStatus::Pending,
            project_id: project_id.map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProjectDraft {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    subtasks: Vec<TaskDraft>,
}

impl ProjectDraft {
    fn into_project(self) -> Project {
        let id = new_id();
        let subtasks = self
            .subtasks
            .into_iter()
            .map(|t| t.into_task(Some(&id)))
            .collect();
        Project {
            id,
            title: self.title,
            description: self.description,
            subtasks,
            progress: 0,
            status: ProjectStatus::Active,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrainDumpDraft {
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default)]
    clarifying_questions: Vec<String>,
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    tasks: Vec<TaskDraft>,
    #[serde(default)]
    projects: Vec<ProjectDraft>,
    #[serde(default)]
    learned_facts: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedInputDraft {
    #[serde(default)]
    new_tasks: Vec<TaskDraft>,
    #[serde(default)]
    suggestions: String,
    #[serde(default)]
    learned_facts: Vec<String>,
}

impl Agent {
    /// Coach the user from a brain-dump conversation towards a plan.
    pub async fn analyze_brain_dump(
        &self,
        history: &[HistoryEntry],
        ctx: PlanningContext<'_>,
    ) -> BrainDumpAnalysis {
        if !self.llm().has_credentials() {
            return BrainDumpAnalysis::fallback("API Key Missing");
        }

        let knowledge = ctx.knowledge.context_text().await;
        let request = GenerateRequest {
            model: self.model().to_string(),
            system_instruction: build_brain_dump_instruction(ctx.profile, &knowledge),
            contents: history_to_contents(history),
            response_schema: Some(brain_dump_schema()),
            ..Default::default()
        };

        match self.request_json::<BrainDumpDraft>(&request).await {
            Ok(draft) => {
                ctx.facts.record_all(draft.learned_facts);
                BrainDumpAnalysis {
                    tasks: draft.tasks.into_iter().map(|t| t.into_task(None)).collect(),
                    projects: draft
                        .projects
                        .into_iter()
                        .map(ProjectDraft::into_project)
                        .collect(),
                    strategy: draft
                        .strategy
                        .filter(|s| !s.trim().is_empty())
                        .unwrap_or_else(|| "Analysis complete.".to_string()),
                    clarifying_questions: draft.clarifying_questions,
                    is_complete: draft.is_complete,
                }
            }
            Err(e) => {
                tracing::error!("Brain dump analysis failed: {}", e);
                BrainDumpAnalysis::fallback("Connection interrupted.")
            }
        }
    }

    /// Turn a free-text request into new tasks.
    pub async fn parse_natural_input(&self, input: &str, ctx: PlanningContext<'_>) -> ParsedInput {
        if !self.llm().has_credentials() {
            return ParsedInput {
                new_tasks: Vec::new(),
                suggestions: "API Key missing.".to_string(),
            };
        }

        let knowledge = ctx.knowledge.context_text().await;
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let request = GenerateRequest {
            model: self.model().to_string(),
            system_instruction: build_parse_instruction(ctx.profile, &knowledge, &now),
            contents: vec![Content::user(input)],
            response_schema: Some(parse_input_schema()),
            ..Default::default()
        };

        match self.request_json::<ParsedInputDraft>(&request).await {
            Ok(draft) => {
                ctx.facts.record_all(draft.learned_facts);
                ParsedInput {
                    new_tasks: draft
                        .new_tasks
                        .into_iter()
                        .map(|t| t.into_task(None))
                        .collect(),
                    suggestions: draft.suggestions,
                }
            }
            Err(e) => {
                tracing::error!("Input parsing failed: {}", e);
                ParsedInput {
                    new_tasks: Vec::new(),
                    suggestions: "Error processing input.".to_string(),
                }
            }
        }
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        request: &GenerateRequest,
    ) -> Result<T, PlanningError> {
        let response = self.llm().generate_content(request).await?;
        let text = response
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or(PlanningError::Empty)?;
        Ok(serde_json::from_str(strip_code_fence(&text))?)
    }
}

/// Remove a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").ok());

    match fence
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
    {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

fn task_schema(require_auto_execute: bool) -> Value {
    let mut required = vec![
        "title",
        "estimatedDuration",
        "priority",
        "energyCost",
        "category",
        "isAiGeneratable",
    ];
    if require_auto_execute {
        required.push("autoExecuteWithAI");
    }
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "estimatedDuration": { "type": "NUMBER" },
            "priority": { "type": "STRING", "enum": ["CRITICAL", "HIGH", "MEDIUM", "LOW"] },
            "energyCost": { "type": "STRING", "enum": ["HIGH", "LOW"] },
            "category": { "type": "STRING", "enum": ["WORK", "LEARNING", "LIFE"] },
            "isAiGeneratable": { "type": "BOOLEAN" },
            "autoExecuteWithAI": { "type": "BOOLEAN" }
        },
        "required": required
    })
}

fn brain_dump_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "strategy": {
                "type": "STRING",
                "description": "Your analysis of their situation, acknowledging their unique skills and constraints."
            },
            "clarifyingQuestions": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "At most 3 high-impact questions that narrow down the plan."
            },
            "isComplete": {
                "type": "BOOLEAN",
                "description": "True when the plan is ready for the dashboard, false while input is still needed."
            },
            "tasks": { "type": "ARRAY", "items": task_schema(false) },
            "projects": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "subtasks": { "type": "ARRAY", "items": task_schema(false) }
                    },
                    "required": ["title", "description", "subtasks"]
                }
            },
            "learnedFacts": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["strategy", "clarifyingQuestions", "isComplete", "tasks", "projects"]
    })
}

fn parse_input_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "newTasks": { "type": "ARRAY", "items": task_schema(true) },
            "suggestions": { "type": "STRING" },
            "learnedFacts": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["newTasks", "suggestions"]
    })
}
