// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::{CompletionRequest, LlmClient};
use crate::config::LlmSettings;
use crate::errors::{LlmflowError, LlmflowResult};

/// Client for any endpoint speaking the `/chat/completions` protocol
pub struct OpenAiClient {
    settings: LlmSettings,
    client: Client,
}

impl OpenAiClient {
    /// Create a client; the API key is only required once a call is made
    pub fn new(settings: LlmSettings) -> LlmflowResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| LlmflowError::Config {
                message: format!("Failed to create HTTP client: {}", e),
                help: None,
            })?;

        Ok(Self { settings, client })
    }

    fn build_body(&self, request: &CompletionRequest) -> ChatCompletionsRequest {
        let response_format = request.response_schema.as_ref().map(|schema| {
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.schema,
                    "strict": true,
                }
            })
        });

        ChatCompletionsRequest {
            model: self.settings.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature.unwrap_or(self.settings.temperature),
            response_format,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> LlmflowResult<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| LlmflowError::Config {
                message: "No API key configured for the LLM provider".into(),
                help: Some("Set OPENAI_API_KEY in the environment or in a .env file".into()),
            })?;

        let url = format!("{}/chat/completions", self.settings.base_url);
        tracing::debug!(
            model = %self.settings.model,
            structured = request.response_schema.is_some(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(LlmflowError::External {
                service: self.provider_name().to_string(),
                message: format!("API error ({}): {}", status, error_text),
            });
        }

        let body: ChatCompletionsResponse = response.json().await?;
        let message = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LlmflowError::External {
                service: self.provider_name().to_string(),
                message: "response contained no choices".into(),
            })?;

        if let Some(refusal) = message.refusal {
            return Err(LlmflowError::External {
                service: self.provider_name().to_string(),
                message: format!("model refused: {}", refusal),
            });
        }

        Ok(message.content.unwrap_or_default())
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Message, ResponseSchema};

    #[test]
    fn test_body_carries_strict_schema() {
        let client = OpenAiClient::new(LlmSettings::default()).unwrap();
        let request = CompletionRequest {
            messages: vec![Message::system("plan"), Message::user("bar chart")],
            temperature: None,
            response_schema: Some(ResponseSchema {
                name: "ChartSpec".into(),
                schema: json!({"type": "object"}),
            }),
        };

        let body = serde_json::to_value(client.build_body(&request)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(body["response_format"]["json_schema"]["name"], "ChartSpec");
    }

    #[test]
    fn test_plain_request_has_no_response_format() {
        let client = OpenAiClient::new(LlmSettings::default()).unwrap();
        let body =
            serde_json::to_value(client.build_body(&CompletionRequest::prompt("hi"))).unwrap();
        assert!(body.get("response_format").is_none());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let client = OpenAiClient::new(LlmSettings::default()).unwrap();
        let err = client
            .complete(&CompletionRequest::prompt("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmflowError::Config { .. }));
    }
}
