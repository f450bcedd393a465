// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Scripted client for tests and offline runs

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{CompletionRequest, LlmClient};
use crate::errors::{LlmflowError, LlmflowResult};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Return this text
    Text(String),
    /// Fail the call with a transport error carrying this message
    Failure(String),
}

impl From<String> for ScriptedResponse {
    fn from(text: String) -> Self {
        ScriptedResponse::Text(text)
    }
}

impl From<&str> for ScriptedResponse {
    fn from(text: &str) -> Self {
        ScriptedResponse::Text(text.to_string())
    }
}

/// Returns queued responses in order and records every request
///
/// A call made after the script is exhausted fails, so tests also catch
/// unexpected extra calls.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new<I, R>(responses: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ScriptedResponse>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new((0..16).map(|_| ScriptedResponse::Failure(message.clone())))
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Copies of the requests made so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> LlmflowResult<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());

        match next {
            Some(ScriptedResponse::Text(text)) => Ok(text),
            Some(ScriptedResponse::Failure(message)) => Err(LlmflowError::External {
                service: self.provider_name().to_string(),
                message,
            }),
            None => Err(LlmflowError::External {
                service: self.provider_name().to_string(),
                message: "no scripted response left".into(),
            }),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_responses_in_order() {
        let client = ScriptedClient::new(["one", "two"]);

        let first = client.complete(&CompletionRequest::prompt("a")).await.unwrap();
        let second = client.complete(&CompletionRequest::prompt("b")).await.unwrap();

        assert_eq!(first, "one");
        assert_eq!(second, "two");
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.requests()[1].text(), "b");
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let client = ScriptedClient::new(Vec::<String>::new());
        let err = client
            .complete(&CompletionRequest::prompt("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmflowError::External { .. }));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_client() {
        let client = ScriptedClient::failing("connection reset");
        let err = client
            .complete(&CompletionRequest::prompt("a"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
