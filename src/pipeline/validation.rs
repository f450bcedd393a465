// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Pipeline validation
//!
//! Validates a pipeline topology before any step runs.

use std::collections::HashSet;

use crate::errors::LlmflowError;
use crate::pipeline::{DagBuilder, PipelineSpec};

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate a pipeline topology
    pub fn validate(spec: &PipelineSpec) -> Result<ValidationResult, LlmflowError> {
        let mut result = ValidationResult::new();

        if spec.steps.is_empty() {
            result.add_error("Pipeline has no steps defined");
        }

        let mut seen_names = HashSet::new();
        for step in &spec.steps {
            if step.name.trim().is_empty() {
                result.add_error("Step with empty name");
            }
            if !seen_names.insert(&step.name) {
                result.add_error(&format!("Duplicate step name: '{}'", step.name));
            }
            if step.depends_on.contains(&step.name) {
                result.add_error(&format!("Step '{}' depends on itself", step.name));
            }
        }

        // Duplicate names make the name lookup in the DAG ambiguous
        if result.is_valid() {
            match DagBuilder::build(spec) {
                Ok(_) => {}
                Err(LlmflowError::CircularDependency { steps }) => {
                    result.add_error(&format!("Circular dependency: {}", steps.join(" → ")));
                }
                Err(LlmflowError::UnknownDependency { step, dependency }) => {
                    result.add_error(&format!(
                        "Step '{}' depends on unknown step '{}'",
                        step, dependency
                    ));
                }
                Err(e) => {
                    result.add_error(&format!("DAG validation error: {}", e));
                }
            }
        }

        for (idx, step) in spec.steps.iter().enumerate() {
            for dep in &step.depends_on {
                let declared_later = spec.steps[idx + 1..].iter().any(|s| &s.name == dep);
                if declared_later {
                    result.add_warning(&format!(
                        "Step '{}' depends on '{}' which is declared after it; \
                         execution order will differ from declaration order",
                        step.name, dep
                    ));
                }
            }
        }

        Ok(result)
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StepSpec;

    fn step(name: &str, deps: &[&str]) -> StepSpec {
        StepSpec {
            name: name.into(),
            description: None,
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn spec(steps: Vec<StepSpec>) -> PipelineSpec {
        PipelineSpec {
            name: "test".into(),
            description: None,
            steps,
        }
    }

    #[test]
    fn test_validate_empty_pipeline() {
        let result = PipelineValidator::validate(&spec(vec![])).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors[0].contains("no steps"));
    }

    #[test]
    fn test_validate_duplicate_names() {
        let result =
            PipelineValidator::validate(&spec(vec![step("dup", &[]), step("dup", &[])])).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("Duplicate")));
    }

    #[test]
    fn test_validate_cycle() {
        let result =
            PipelineValidator::validate(&spec(vec![step("a", &["b"]), step("b", &["a"])])).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("Circular")));
    }

    #[test]
    fn test_forward_reference_is_a_warning() {
        let result =
            PipelineValidator::validate(&spec(vec![step("late", &["early"]), step("early", &[])]))
                .unwrap();
        assert!(result.is_valid());
        assert!(result.has_warnings());
    }

    #[test]
    fn test_linear_chain_is_clean() {
        let result = PipelineValidator::validate(&spec(vec![
            step("summarize_schema", &[]),
            step("parse_request", &["summarize_schema"]),
        ]))
        .unwrap();
        assert!(result.is_valid());
        assert!(!result.has_warnings());
    }
}
