// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use super::LlmflowError;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Pick a suggestion for an error, if one applies
    pub fn for_error(error: &LlmflowError) -> Option<Self> {
        match error {
            LlmflowError::MissingPrecondition { field, .. } => Some(Self::provide_input(field)),
            LlmflowError::InvalidTable { .. } | LlmflowError::UnsupportedFormat { .. } => {
                Some(Self::fix_table())
            }
            LlmflowError::Generation { .. } => Some(Self::refine_request()),
            LlmflowError::External { .. } => Some(Self::check_provider()),
            LlmflowError::Config { .. } | LlmflowError::Toml { .. } => {
                Some(Self::fix_config())
            }
            _ => None,
        }
    }

    /// Suggest supplying a missing input
    pub fn provide_input(field: &str) -> Self {
        Self {
            action: format!("Provide '{}'", field),
            steps: vec![
                format!("The pipeline needs a non-empty '{}' before it starts", field),
                "No LLM call was made for this run".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest fixing the tabular input
    pub fn fix_table() -> Self {
        Self {
            action: "Fix the data file".into(),
            steps: vec![
                "Data must be an array of records with at least one row".into(),
                "Each record maps column names to scalar values".into(),
            ],
            commands: vec![
                "# Minimal example (sales.json):".into(),
                "[{\"region\": \"EU\", \"sales\": 120}, {\"region\": \"US\", \"sales\": 95}]".into(),
            ],
        }
    }

    /// Suggest rephrasing a request after a generation/schema error
    pub fn refine_request() -> Self {
        Self {
            action: "Refine the request".into(),
            steps: vec![
                "The model produced a plan that does not match the data".into(),
                "Name the columns explicitly and keep to one chart per request".into(),
            ],
            commands: vec![
                "# Inspect the available columns:".into(),
                "jq '.[0] | keys' data.json".into(),
            ],
        }
    }

    /// Suggest checking the LLM provider configuration
    pub fn check_provider() -> Self {
        Self {
            action: "Check the LLM provider".into(),
            steps: vec![
                "The generation service could not be reached or rejected the request".into(),
                "Verify the API key, base URL and model name".into(),
            ],
            commands: vec![
                "# Show the effective settings:".into(),
                "llmflow config".into(),
                "".into(),
                "# Set the key for this shell:".into(),
                "export OPENAI_API_KEY=...".into(),
            ],
        }
    }

    /// Suggest fixing the configuration file
    pub fn fix_config() -> Self {
        Self {
            action: "Fix llmflow.toml".into(),
            steps: vec![
                "The configuration file could not be parsed".into(),
                "Check for misspelled keys and string quoting".into(),
            ],
            commands: vec!["llmflow config".into()],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
