// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Error types
//!
//! Every failure a pipeline run can surface is an [`LlmflowError`]. Callers
//! that render errors to a user should branch on [`LlmflowError::kind`] so
//! that bad input, generation/schema problems and unexpected failures get
//! distinct messages.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for llmflow operations
pub type LlmflowResult<T> = Result<T, LlmflowError>;

/// Coarse classification used when presenting an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied missing or unusable input
    BadInput,
    /// The generation service produced something that does not fit the schema
    Generation,
    /// Anything else: collaborator failures, topology bugs, IO
    Unexpected,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadInput => write!(f, "bad input"),
            Self::Generation => write!(f, "generation error"),
            Self::Unexpected => write!(f, "unexpected failure"),
        }
    }
}

/// Main error type for llmflow
#[derive(Error, Debug, Diagnostic)]
pub enum LlmflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Missing precondition: '{field}' is required by step '{step}'")]
    #[diagnostic(
        code(llmflow::missing_precondition),
        help("Provide a non-empty '{field}' before running the pipeline")
    )]
    MissingPrecondition { step: String, field: String },

    #[error("Invalid table: {reason}")]
    #[diagnostic(
        code(llmflow::invalid_table),
        help("Tables are JSON or YAML arrays of records, e.g. [{{\"region\": \"EU\", \"sales\": 10}}]")
    )]
    InvalidTable { reason: String },

    #[error("File not found: {path}")]
    #[diagnostic(code(llmflow::file_not_found))]
    FileNotFound {
        path: PathBuf,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(llmflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Unsupported data format for: {path}")]
    #[diagnostic(
        code(llmflow::unsupported_format),
        help("Supported formats: .csv, .json, .yaml, .yml")
    )]
    UnsupportedFormat { path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────────
    // Generation Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Generation failed: {message}")]
    #[diagnostic(code(llmflow::generation))]
    Generation {
        message: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Collaborator Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{service} request failed: {message}")]
    #[diagnostic(code(llmflow::external))]
    External { service: String, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid pipeline '{pipeline}': {reason}")]
    #[diagnostic(code(llmflow::invalid_pipeline))]
    InvalidPipeline { pipeline: String, reason: String },

    #[error("Circular dependency detected")]
    #[diagnostic(
        code(llmflow::circular_dependency),
        help("Review the step dependencies to remove the cycle")
    )]
    CircularDependency { steps: Vec<String> },

    #[error("Step '{step}' depends on unknown step '{dependency}'")]
    #[diagnostic(
        code(llmflow::unknown_dependency),
        help("Check that '{dependency}' is declared in the pipeline")
    )]
    UnknownDependency { step: String, dependency: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(code(llmflow::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("IO error: {message}")]
    #[diagnostic(code(llmflow::io_error))]
    Io { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(llmflow::json_error))]
    Json { message: String },

    #[error("YAML error: {message}")]
    #[diagnostic(code(llmflow::yaml_error))]
    Yaml { message: String },

    #[error("TOML error: {message}")]
    #[diagnostic(code(llmflow::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for LlmflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_json::Error> for LlmflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for LlmflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<toml::de::Error> for LlmflowError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<toml::ser::Error> for LlmflowError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<reqwest::Error> for LlmflowError {
    fn from(e: reqwest::Error) -> Self {
        Self::External {
            service: "llm".to_string(),
            message: e.to_string(),
        }
    }
}

impl LlmflowError {
    /// Create a missing precondition error for a step
    pub fn missing(step: &str, field: &str) -> Self {
        Self::MissingPrecondition {
            step: step.to_string(),
            field: field.to_string(),
        }
    }

    /// Create a generation error without extra help
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            help: None,
        }
    }

    /// Create a generation error for an artifact that failed to parse
    pub fn schema_mismatch(artifact: &str, detail: &str) -> Self {
        Self::Generation {
            message: format!("response is not a valid {}: {}", artifact, detail),
            help: Some(
                "Rephrase the request so it only refers to columns present in the data".into(),
            ),
        }
    }

    /// Classify this error for presentation
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingPrecondition { .. }
            | Self::InvalidTable { .. }
            | Self::FileNotFound { .. }
            | Self::FileReadError { .. }
            | Self::UnsupportedFormat { .. } => ErrorKind::BadInput,
            Self::Generation { .. } => ErrorKind::Generation,
            Self::External { .. }
            | Self::InvalidPipeline { .. }
            | Self::CircularDependency { .. }
            | Self::UnknownDependency { .. }
            | Self::Config { .. }
            | Self::Io { .. }
            | Self::Json { .. }
            | Self::Yaml { .. }
            | Self::Toml { .. } => ErrorKind::Unexpected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_separate_input_from_generation() {
        assert_eq!(
            LlmflowError::missing("parse_request", "user_request").kind(),
            ErrorKind::BadInput
        );
        assert_eq!(
            LlmflowError::schema_mismatch("ChartSpec", "unknown field `foo`").kind(),
            ErrorKind::Generation
        );
        let external = LlmflowError::External {
            service: "llm".into(),
            message: "connection refused".into(),
        };
        assert_eq!(external.kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_missing_precondition_message() {
        let err = LlmflowError::missing("summarize_schema", "table");
        assert_eq!(
            err.to_string(),
            "Missing precondition: 'table' is required by step 'summarize_schema'"
        );
    }
}
