//! Scripted model client for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GenerateRequest, LlmClient, LlmError, ModelResponse};

/// Pops queued responses in order and records every request it sees.
///
/// When the queue runs dry, the fallback response (if any) is repeated;
/// otherwise the call fails with a parse error.
pub struct MockLlmClient {
    credentials: bool,
    responses: Mutex<VecDeque<Result<ModelResponse, String>>>,
    fallback: Option<ModelResponse>,
    calls: Mutex<Vec<GenerateRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            credentials: true,
            responses: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_credentials() -> Self {
        Self {
            credentials: false,
            ..Self::new()
        }
    }

    pub fn repeating(response: ModelResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new()
        }
    }

    pub fn queue(self, response: ModelResponse) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn queue_error(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn generate_content(&self, request: &GenerateRequest) -> Result<ModelResponse, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(LlmError::Http {
                status: 500,
                message,
            }),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| LlmError::Parse("mock response queue is empty".to_string())),
        }
    }
}
