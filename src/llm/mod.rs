// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Generation service interface
//!
//! Steps talk to the hosted model only through [`LlmClient`]. Retries, auth
//! and rate limits belong to the implementation, never to the pipeline.

mod openai;
pub mod prompts;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::LlmflowResult;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// JSON Schema the response must conform to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Schema name reported to the provider
    pub name: String,
    /// JSON Schema document
    pub schema: serde_json::Value,
}

/// One completion call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    /// Sampling temperature; `None` uses the client default
    pub temperature: Option<f32>,
    /// Constrain the output to this schema
    pub response_schema: Option<ResponseSchema>,
}

impl CompletionRequest {
    /// A single user prompt
    pub fn prompt(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Concatenated message contents, used for logging and test assertions
    pub fn text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Hosted model client
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion and return the raw response text
    async fn complete(&self, request: &CompletionRequest) -> LlmflowResult<String>;

    /// Get the name of this provider
    fn provider_name(&self) -> &str;

    /// Get the model identifier
    fn model_name(&self) -> &str;
}
