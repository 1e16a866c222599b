//! Core agent loop implementation.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::config::Config;
use crate::llm::{Content, GeminiClient, GenerateRequest, LlmClient, LlmError, ModelResponse};
use crate::tools::{ToolContext, ToolRegistry};

use super::citations::format_reference_sources;
use super::context::{history_to_contents, ExecutionContext};
use super::prompt::{build_execution_instruction, default_instruction};

/// Returned when no API key is configured.
pub const MISSING_CREDENTIALS_MESSAGE: &str = "API Key missing.";
/// Returned when a model call fails.
pub const EXECUTION_FAILED_MESSAGE: &str = "Execution failed.";
/// Returned when the task has no title.
pub const TASK_TITLE_REQUIRED_MESSAGE: &str = "Task title is required.";
/// Returned when the final response carries no text.
pub const EMPTY_RESULT_MESSAGE: &str = "Task executed.";

/// Why an execution ended on a fallback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionFailure {
    InvalidTask,
    MissingCredentials,
    Provider,
}

/// Outcome of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Text shown to the user. Always present.
    pub text: String,
    /// Tool-dispatch rounds performed.
    pub rounds: usize,
    /// The round cap was hit while the model still wanted tools.
    pub truncated: bool,
    pub failure: Option<ExecutionFailure>,
}

impl ExecutionReport {
    fn failed(failure: ExecutionFailure, text: &str, rounds: usize) -> Self {
        Self {
            text: text.to_string(),
            rounds,
            truncated: false,
            failure: Some(failure),
        }
    }
}

/// The task execution agent.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    model: String,
    max_tool_rounds: usize,
}

impl Agent {
    /// Create a new agent backed by Gemini.
    pub fn new(config: &Config) -> Self {
        let llm = Arc::new(GeminiClient::new(
            config.api_key.clone(),
            config.gemini_base_url.clone(),
            config.request_timeout,
        ));
        Self::with_client(llm, config.default_model.clone(), config.max_tool_rounds)
    }

    /// Create an agent over any model client.
    pub fn with_client(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            llm,
            tools: ToolRegistry::new(),
            model: model.into(),
            max_tool_rounds,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub(crate) fn llm(&self) -> &dyn LlmClient {
        self.llm.as_ref()
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    /// Execute a task and return the text to show the user.
    ///
    /// Never fails: missing credentials and provider errors turn into fixed
    /// messages. Hitting the round cap is silent here; use
    /// [`execute_detailed`](Self::execute_detailed) to observe it.
    pub async fn execute(&self, ctx: ExecutionContext<'_>) -> String {
        self.execute_detailed(ctx).await.text
    }

    /// Execute a task and report rounds, truncation and failure kind.
    pub async fn execute_detailed(&self, ctx: ExecutionContext<'_>) -> ExecutionReport {
        let title = ctx.task.title.trim();
        if title.is_empty() {
            tracing::warn!("Refusing to execute a task without a title");
            return ExecutionReport::failed(
                ExecutionFailure::InvalidTask,
                TASK_TITLE_REQUIRED_MESSAGE,
                0,
            );
        }

        if !self.llm.has_credentials() {
            tracing::warn!("No API key configured; skipping execution of {:?}", title);
            return ExecutionReport::failed(
                ExecutionFailure::MissingCredentials,
                MISSING_CREDENTIALS_MESSAGE,
                0,
            );
        }

        let knowledge = ctx.knowledge.context_text().await;
        let system_instruction =
            build_execution_instruction(ctx.task, ctx.profile, &knowledge, &self.tools);

        let instruction = match ctx.instruction.map(str::trim).filter(|i| !i.is_empty()) {
            Some(instruction) => instruction.to_string(),
            None => default_instruction(ctx.task),
        };

        let mut contents = history_to_contents(ctx.history);
        contents.push(Content::user(instruction));

        let mut request = GenerateRequest {
            model: self.model.clone(),
            system_instruction,
            contents,
            functions: self.tools.function_declarations(),
            grounding: true,
            location: ctx.location,
            response_schema: None,
        };

        let tool_ctx = ctx.profile.tool_context();
        let mut rounds = 0;

        match self.run_rounds(&mut request, &tool_ctx, &mut rounds).await {
            Ok(response) => {
                let truncated = response.has_pending_calls();
                if truncated {
                    tracing::warn!(
                        "Stopped after {} tool rounds with calls still pending",
                        rounds
                    );
                }
                ExecutionReport {
                    text: final_text(&response),
                    rounds,
                    truncated,
                    failure: None,
                }
            }
            Err(e) => {
                tracing::error!("Execution error after {} tool rounds: {}", rounds, e);
                ExecutionReport::failed(ExecutionFailure::Provider, EXECUTION_FAILED_MESSAGE, rounds)
            }
        }
    }

    /// Call the model, dispatching requested tools until it stops asking or
    /// the round cap is reached. Returns the last response.
    async fn run_rounds(
        &self,
        request: &mut GenerateRequest,
        tool_ctx: &ToolContext,
        rounds: &mut usize,
    ) -> Result<ModelResponse, LlmError> {
        let mut response = self.llm.generate_content(request).await?;

        while response.has_pending_calls() && *rounds < self.max_tool_rounds {
            *rounds += 1;
            tracing::debug!(
                "Tool round {} with {} call(s)",
                rounds,
                response.function_calls.len()
            );

            let model_turn = response
                .content
                .take()
                .unwrap_or_else(|| Content::tool_calls(&response.function_calls));
            request.contents.push(model_turn);

            let results = join_all(response.function_calls.iter().map(|call| {
                tracing::info!("Calling tool: {} with args: {:?}", call.name, call.arguments);
                self.tools.execute(call, tool_ctx)
            }))
            .await;
            request.contents.push(Content::tool_results(results));

            response = self.llm.generate_content(request).await?;
        }

        Ok(response)
    }
}

/// Response text plus the reference block, if the answer was grounded.
fn final_text(response: &ModelResponse) -> String {
    let mut text = response
        .text
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| EMPTY_RESULT_MESSAGE.to_string());

    if let Some(sources) = response.grounding.as_ref().and_then(format_reference_sources) {
        text.push_str(&sources);
    }
    text
}
