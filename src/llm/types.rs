//! Provider-neutral conversation types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    /// Results of tool invocations requested by the model.
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Outcome of executing a [`ToolCall`], correlated by `call_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub result: Map<String, Value>,
}

/// One piece of a conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Text(String),
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
    /// Provider-native form of this turn, replayed verbatim when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl Content {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text(text.into())],
            raw: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    /// A model turn carrying only the given tool calls.
    pub fn tool_calls(calls: &[ToolCall]) -> Self {
        Self {
            role: Role::Model,
            parts: calls.iter().cloned().map(Part::ToolCall).collect(),
            raw: None,
        }
    }

    /// A tool turn carrying a batch of results.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::Tool,
            parts: results.into_iter().map(Part::ToolResult).collect(),
            raw: None,
        }
    }
}

/// Schema for one declared function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Full request for a single model call.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub model: String,
    pub system_instruction: String,
    pub contents: Vec<Content>,
    /// Declared functions the model may call.
    pub functions: Vec<FunctionDeclaration>,
    /// Enable the provider's built-in web search and maps retrieval.
    pub grounding: bool,
    /// Bias retrieval towards this location.
    pub location: Option<GeoLocation>,
    /// Request JSON output matching this schema.
    pub response_schema: Option<Value>,
}

/// A web or maps reference the model used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundingSource {
    Web { title: Option<String>, uri: String },
    Maps { title: Option<String>, uri: String },
}

/// Citation data attached to a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundingMetadata {
    pub sources: Vec<GroundingSource>,
}

/// Result of a single model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    /// Raw content of the first candidate, replayed into the conversation.
    pub content: Option<Content>,
    /// Concatenated text parts, if any.
    pub text: Option<String>,
    pub function_calls: Vec<ToolCall>,
    pub grounding: Option<GroundingMetadata>,
}

impl ModelResponse {
    /// A plain text answer with no tool calls.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            content: Some(Content::text(Role::Model, text.clone())),
            text: Some(text),
            function_calls: Vec::new(),
            grounding: None,
        }
    }

    /// A response requesting the given tool calls.
    pub fn from_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            content: Some(Content::tool_calls(&calls)),
            text: None,
            function_calls: calls,
            grounding: None,
        }
    }

    pub fn with_grounding(mut self, grounding: GroundingMetadata) -> Self {
        self.grounding = Some(grounding);
        self
    }

    pub fn has_pending_calls(&self) -> bool {
        !self.function_calls.is_empty()
    }
}
