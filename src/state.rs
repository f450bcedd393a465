// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Shared run state
//!
//! Each pipeline variant owns a fixed state struct. Steps fill in optional
//! fields as the run progresses and read earlier fields through accessors
//! that fail with [`LlmflowError::MissingPrecondition`] when a required field
//! was never written. Fields are additive: no step clears what an earlier
//! step wrote.

use serde::{Deserialize, Serialize};

use crate::errors::LlmflowError;

/// Ordered, append-only log of notes written by steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageLog(Vec<String>);

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a note
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any entry contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.0.iter().any(|m| m.contains(needle))
    }
}

/// Work-in-progress for one pipeline run
pub trait PipelineState: Send + Sync {
    /// Notes appended by steps, in order
    fn messages(&self) -> &MessageLog;

    fn messages_mut(&mut self) -> &mut MessageLog;
}

/// Borrow a field written by an earlier step or fail as a missing precondition
pub fn require<'a, T>(field: &'a Option<T>, step: &str, name: &str) -> Result<&'a T, LlmflowError> {
    field.as_ref().ok_or_else(|| LlmflowError::missing(step, name))
}

/// Borrow a text field that must be present and non-blank
pub fn require_text<'a>(
    field: &'a Option<String>,
    step: &str,
    name: &str,
) -> Result<&'a str, LlmflowError> {
    match field.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(LlmflowError::missing(step, name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_log_is_ordered() {
        let mut log = MessageLog::new();
        log.push("first");
        log.push(String::from("second"));
        assert_eq!(log.entries(), &["first".to_string(), "second".to_string()]);
        assert!(log.contains("sec"));
    }

    #[test]
    fn test_require_text_rejects_blank() {
        let blank = Some("   ".to_string());
        let err = require_text(&blank, "parse_request", "user_request").unwrap_err();
        assert!(matches!(err, LlmflowError::MissingPrecondition { .. }));

        let present = Some("bar chart".to_string());
        assert_eq!(require_text(&present, "s", "f").unwrap(), "bar chart");
    }

    #[test]
    fn test_require_missing_field() {
        let missing: Option<u32> = None;
        assert!(require(&missing, "critic", "chart_spec").is_err());
    }
}
