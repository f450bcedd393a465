// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Structured artifacts
//!
//! An artifact is a typed value the generation service is asked to produce.
//! Its JSON Schema is sent with the request so the provider constrains the
//! output, and the response is parsed back with `deny_unknown_fields`, so a
//! response carrying undeclared fields is rejected rather than silently
//! accepted.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::OnceLock;

use crate::errors::{LlmflowError, LlmflowResult};
use crate::llm::{CompletionRequest, LlmClient, ResponseSchema};

/// A value produced by constrained generation
pub trait StructuredArtifact: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// Name reported to the provider and used in messages
    const NAME: &'static str;

    /// Strict JSON Schema for this artifact
    fn json_schema() -> serde_json::Value;

    fn response_schema() -> ResponseSchema {
        ResponseSchema {
            name: Self::NAME.to_string(),
            schema: Self::json_schema(),
        }
    }

    /// Parse a raw model response
    fn parse(raw: &str) -> LlmflowResult<Self> {
        let body = extract_json(raw)
            .ok_or_else(|| LlmflowError::schema_mismatch(Self::NAME, "response is not JSON"))?;
        serde_json::from_str(body)
            .map_err(|e| LlmflowError::schema_mismatch(Self::NAME, &e.to_string()))
    }

    /// Pretty JSON for prompts and display
    fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn fenced() -> &'static Regex {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    FENCED.get_or_init(|| {
        Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").unwrap_or_else(|_| unreachable!())
    })
}

/// Locate the JSON object in a model response
///
/// Accepts a bare object or one wrapped in a Markdown code fence. Anything
/// that does not start with `{` after unwrapping is rejected.
pub fn extract_json(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let body = match fenced().captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    };

    if body.starts_with('{') && body.ends_with('}') {
        Some(body)
    } else {
        None
    }
}

/// Run one constrained generation call and parse the artifact
///
/// A response that does not parse is a generation error; callers that want to
/// recover use [`correct_once`] instead.
pub async fn generate<A: StructuredArtifact>(
    llm: &dyn LlmClient,
    request: CompletionRequest,
) -> LlmflowResult<A> {
    let raw = llm
        .complete(&request.with_schema(A::response_schema()))
        .await?;
    A::parse(&raw)
}

/// Outcome of a corrective call
#[derive(Debug, Clone, PartialEq)]
pub enum Correction<A> {
    /// The response parsed into a valid replacement
    Replaced(A),
    /// The response was unusable; the caller keeps its original artifact
    Rejected { reason: String },
}

/// Make exactly one corrective call
///
/// The request carries the same response schema as [`generate`]. Transport
/// failures propagate. A response that cannot be parsed is reported as
/// [`Correction::Rejected`] and never retried.
pub async fn correct_once<A: StructuredArtifact>(
    llm: &dyn LlmClient,
    request: CompletionRequest,
) -> LlmflowResult<Correction<A>> {
    let raw = llm
        .complete(&request.with_schema(A::response_schema()))
        .await?;

    match A::parse(&raw) {
        Ok(artifact) => Ok(Correction::Replaced(artifact)),
        Err(e) => Ok(Correction::Rejected {
            reason: match e {
                LlmflowError::Generation { message, .. } => message,
                other => other.to_string(),
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedClient;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl StructuredArtifact for Point {
        const NAME: &'static str = "Point";

        fn json_schema() -> serde_json::Value {
            json!({
                "type": "object",
                "properties": {"x": {"type": "integer"}, "y": {"type": "integer"}},
                "required": ["x", "y"],
                "additionalProperties": false
            })
        }
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json(r#" {"x": 1} "#), Some(r#"{"x": 1}"#));
        assert_eq!(
            extract_json("```json\n{\"x\": 1}\n```"),
            Some(r#"{"x": 1}"#)
        );
        assert_eq!(extract_json("Sure! Here you go."), None);
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let err = Point::parse(r#"{"x": 1, "y": 2, "z": 3}"#).unwrap_err();
        assert!(matches!(err, LlmflowError::Generation { .. }));
        assert!(err.to_string().contains("Point"));
    }

    #[tokio::test]
    async fn test_generate_sends_schema() {
        let client = ScriptedClient::new([r#"{"x": 1, "y": 2}"#]);
        let point: Point = generate(&client, CompletionRequest::prompt("where?"))
            .await
            .unwrap();

        assert_eq!(point, Point { x: 1, y: 2 });
        let sent = client.requests();
        assert_eq!(
            sent[0].response_schema.as_ref().map(|s| s.name.as_str()),
            Some("Point")
        );
    }

    #[tokio::test]
    async fn test_correct_once_rejects_without_retry() {
        let client = ScriptedClient::new(["not json at all", r#"{"x": 1, "y": 2}"#]);
        let outcome: Correction<Point> =
            correct_once(&client, CompletionRequest::prompt("fix")).await.unwrap();

        assert!(matches!(outcome, Correction::Rejected { .. }));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_correct_once_sends_schema() {
        let client = ScriptedClient::new([r#"{"x": 3, "y": 4}"#]);
        let outcome: Correction<Point> =
            correct_once(&client, CompletionRequest::prompt("fix")).await.unwrap();

        assert_eq!(outcome, Correction::Replaced(Point { x: 3, y: 4 }));
        assert_eq!(
            client.requests()[0]
                .response_schema
                .as_ref()
                .map(|s| s.name.as_str()),
            Some("Point")
        );
    }

    #[tokio::test]
    async fn test_correct_once_propagates_transport_failure() {
        let client = ScriptedClient::failing("timeout");
        let result = correct_once::<Point>(&client, CompletionRequest::prompt("fix")).await;
        assert!(matches!(result, Err(LlmflowError::External { .. })));
    }
}
