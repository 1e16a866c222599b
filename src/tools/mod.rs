//! Tool catalog the model may call.
//!
//! The catalog is closed: every supported tool has a [`ToolKind`] variant and
//! dispatch is an exhaustive match. Unknown names still produce a failure
//! result instead of aborting the loop.

mod calendar;
mod email;
mod weather;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::llm::{FunctionDeclaration, ToolCall, ToolResult};

pub use calendar::ScheduleEvent;
pub use email::SendEmail;
pub use weather::GetCurrentWeather;

/// Identity that tool side effects are attributed to.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Display name, used as calendar organizer.
    pub user_name: String,
    /// Address used as the email sender.
    pub user_email: String,
}

/// Errors a tool invocation can end with.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown function")]
    UnknownTool(String),

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Trait for all tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by.
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema for the arguments.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: &Map<String, Value>, ctx: &ToolContext)
        -> anyhow::Result<Map<String, Value>>;
}

/// Supported tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetCurrentWeather,
    SendEmail,
    ScheduleEvent,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [
        ToolKind::GetCurrentWeather,
        ToolKind::SendEmail,
        ToolKind::ScheduleEvent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GetCurrentWeather => "getCurrentWeather",
            ToolKind::SendEmail => "sendEmail",
            ToolKind::ScheduleEvent => "scheduleEvent",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Information about a tool for display purposes.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Holds the tool implementations and dispatches calls to them.
pub struct ToolRegistry {
    weather: GetCurrentWeather,
    email: SendEmail,
    calendar: ScheduleEvent,
}

impl ToolRegistry {
    /// Create a registry with the simulated tool set.
    pub fn new() -> Self {
        Self {
            weather: GetCurrentWeather,
            email: SendEmail,
            calendar: ScheduleEvent,
        }
    }

    fn tool(&self, kind: ToolKind) -> &dyn Tool {
        match kind {
            ToolKind::GetCurrentWeather => &self.weather,
            ToolKind::SendEmail => &self.email,
            ToolKind::ScheduleEvent => &self.calendar,
        }
    }

    /// List all available tools.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        ToolKind::ALL
            .into_iter()
            .map(|kind| {
                let tool = self.tool(kind);
                ToolInfo {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                }
            })
            .collect()
    }

    /// Function declarations sent to the model.
    pub fn function_declarations(&self) -> Vec<FunctionDeclaration> {
        ToolKind::ALL
            .into_iter()
            .map(|kind| {
                let tool = self.tool(kind);
                FunctionDeclaration {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: tool.parameters_schema(),
                }
            })
            .collect()
    }

    /// Execute a call. Never fails: errors become a failure payload.
    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> ToolResult {
        let outcome = match ToolKind::from_name(&call.name) {
            Some(kind) => self
                .tool(kind)
                .execute(&call.arguments, ctx)
                .await
                .map_err(ToolError::from),
            None => Err(ToolError::UnknownTool(call.name.clone())),
        };

        let result = match outcome {
            Ok(result) => result,
            Err(ToolError::UnknownTool(name)) => {
                tracing::warn!("Model requested unknown tool: {}", name);
                status_payload("failed", "Unknown function")
            }
            Err(ToolError::Failed(e)) => {
                tracing::warn!("Tool {} failed: {}", call.name, e);
                status_payload("error", &e.to_string())
            }
        };

        ToolResult {
            call_id: call.id.clone(),
            name: call.name.clone(),
            result,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `{ "status": <status>, "message": <message> }`
pub(crate) fn status_payload(status: &str, message: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("status".to_string(), json!(status));
    payload.insert("message".to_string(), json!(message));
    payload
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(args: &'a Map<String, Value>, key: &str) -> anyhow::Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext {
            user_name: "Ada Lovelace".to_string(),
            user_email: "ada@example.com".to_string(),
        }
    }

    fn call(id: &str, name: &str, args: Value) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: args.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn tool_kind_round_trips_names() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("deleteEverything"), None);
        assert_eq!(ToolKind::from_name("sendemail"), None);
    }

    #[test]
    fn declarations_cover_catalog() {
        let registry = ToolRegistry::new();
        let names: Vec<String> = registry
            .function_declarations()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["getCurrentWeather", "sendEmail", "scheduleEvent"]);
        for decl in registry.function_declarations() {
            assert_eq!(decl.parameters["type"], "object");
            assert!(decl.parameters["required"].is_array());
        }
        assert_eq!(registry.list_tools().len(), 3);
    }

    #[tokio::test]
    async fn unknown_tool_yields_failed_status() {
        let registry = ToolRegistry::new();
        let result = registry
            .execute(&call("c1", "launchRocket", json!({})), &ctx())
            .await;
        assert_eq!(result.call_id, "c1");
        assert_eq!(result.name, "launchRocket");
        assert_eq!(result.result["status"], "failed");
        assert_eq!(result.result["message"], "Unknown function");
    }

    #[tokio::test]
    async fn tool_error_yields_error_status() {
        let registry = ToolRegistry::new();
        let result = registry
            .execute(&call("c2", "sendEmail", json!({"to": "x@y.z"})), &ctx())
            .await;
        assert_eq!(result.call_id, "c2");
        assert_eq!(result.result["status"], "error");
        assert!(result.result["message"]
            .as_str()
            .unwrap()
            .contains("subject"));
    }

    #[tokio::test]
    async fn email_sender_comes_from_context() {
        let registry = ToolRegistry::new();
        let result = registry
            .execute(
                &call(
                    "c3",
                    "sendEmail",
                    json!({"to": "landlord@example.com", "subject": "Leak", "body": "Hi"}),
                ),
                &ctx(),
            )
            .await;
        assert_eq!(result.result["status"], "success");
        assert_eq!(
            result.result["message"],
            "[SIMULATION] Email sent FROM ada@example.com TO landlord@example.com with subject \"Leak\"."
        );
    }
}
