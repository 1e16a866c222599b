//! Model provider interface.
//!
//! The agent talks to the model only through [`LlmClient`], so tests can swap
//! the Gemini client for a scripted fake.

mod error;
mod gemini;
#[cfg(test)]
pub(crate) mod mock;
mod types;

use async_trait::async_trait;

pub use error::LlmError;
pub use gemini::GeminiClient;
pub use types::{
    Content, FunctionDeclaration, GenerateRequest, GeoLocation, GroundingMetadata,
    GroundingSource, ModelResponse, Part, Role, ToolCall, ToolResult,
};

/// A hosted model that supports function calling.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Whether credentials are configured. Callers skip the request when false.
    fn has_credentials(&self) -> bool;

    /// Run one `generateContent` round.
    async fn generate_content(&self, request: &GenerateRequest) -> Result<ModelResponse, LlmError>;
}
