// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Pipeline definition structures
//!
//! A pipeline is a statically declared set of named steps plus their
//! dependencies. [`PipelineSpec`] is the serializable topology; [`Pipeline`]
//! pairs it with the step implementations for one state type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Settings;
use crate::errors::{LlmflowError, LlmflowResult};
use crate::llm::LlmClient;
use crate::pipeline::{DagBuilder, PipelineValidator};
use crate::state::PipelineState;

/// Serializable pipeline topology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Pipeline name
    pub name: String,

    /// Pipeline description
    #[serde(default)]
    pub description: Option<String>,

    /// Steps in declaration order
    pub steps: Vec<StepSpec>,
}

impl PipelineSpec {
    /// Parse a topology from YAML
    pub fn from_yaml(yaml: &str) -> LlmflowResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Serialize the topology to YAML
    pub fn to_yaml(&self) -> LlmflowResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Get a step by name
    pub fn get_step(&self, name: &str) -> Option<&StepSpec> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Get all step names in declaration order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }
}

/// A single step in a pipeline topology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    /// Step name (must be unique within the pipeline)
    pub name: String,

    /// Step description
    #[serde(default)]
    pub description: Option<String>,

    /// Steps that must complete before this one
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Collaborators shared by every step of a run
///
/// Built once by the caller and passed by reference to each step.
#[derive(Clone)]
pub struct StepContext {
    /// Generation service
    pub llm: Arc<dyn LlmClient>,
    /// Effective settings
    pub settings: Arc<Settings>,
}

impl StepContext {
    pub fn new(llm: Arc<dyn LlmClient>, settings: Settings) -> Self {
        Self {
            llm,
            settings: Arc::new(settings),
        }
    }
}

/// One named transformation of a pipeline state
#[async_trait]
pub trait Step<S: PipelineState>: Send + Sync {
    /// Stable step name, used for ordering and tracing
    fn name(&self) -> &str;

    /// One-line description for plans and graphs
    fn description(&self) -> &str {
        ""
    }

    /// Read the fields this step needs and write its outputs
    async fn run(&self, state: &mut S, ctx: &StepContext) -> LlmflowResult<()>;
}

/// A validated topology together with its step implementations
pub struct Pipeline<S: PipelineState> {
    spec: PipelineSpec,
    steps: Vec<Box<dyn Step<S>>>,
    order: Vec<usize>,
}

impl<S: PipelineState> std::fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("spec", &self.spec)
            .field("order", &self.order)
            .finish()
    }
}

impl<S: PipelineState> Pipeline<S> {
    /// Start declaring a pipeline
    pub fn builder(name: &str) -> PipelineBuilder<S> {
        PipelineBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Step names in execution order
    pub fn plan(&self) -> Vec<&str> {
        self.order.iter().map(|&i| self.spec.steps[i].name.as_str()).collect()
    }

    /// Steps in execution order
    pub(crate) fn ordered_steps(&self) -> impl Iterator<Item = &dyn Step<S>> {
        self.order.iter().map(move |&i| self.steps[i].as_ref())
    }
}

/// Builder that declares steps in order
pub struct PipelineBuilder<S: PipelineState> {
    spec: PipelineSpec,
    steps: Vec<Box<dyn Step<S>>>,
}

impl<S: PipelineState> PipelineBuilder<S> {
    pub fn new(name: &str) -> Self {
        Self {
            spec: PipelineSpec {
                name: name.to_string(),
                description: None,
                steps: Vec::new(),
            },
            steps: Vec::new(),
        }
    }

    /// Set the pipeline description
    pub fn description(mut self, description: &str) -> Self {
        self.spec.description = Some(description.to_string());
        self
    }

    /// Append a step that depends on the previously declared one
    pub fn then(self, step: impl Step<S> + 'static) -> Self {
        let deps: Vec<String> = self
            .spec
            .steps
            .last()
            .map(|s| vec![s.name.clone()])
            .unwrap_or_default();
        self.push(Box::new(step), deps)
    }

    /// Append a step with explicit dependencies
    pub fn after(self, deps: &[&str], step: impl Step<S> + 'static) -> Self {
        let deps = deps.iter().map(|d| d.to_string()).collect();
        self.push(Box::new(step), deps)
    }

    fn push(mut self, step: Box<dyn Step<S>>, depends_on: Vec<String>) -> Self {
        let description = match step.description() {
            "" => None,
            d => Some(d.to_string()),
        };
        self.spec.steps.push(StepSpec {
            name: step.name().to_string(),
            description,
            depends_on,
        });
        self.steps.push(step);
        self
    }

    /// Validate the topology and fix the execution order
    pub fn build(self) -> LlmflowResult<Pipeline<S>> {
        let validation = PipelineValidator::validate(&self.spec)?;
        if !validation.is_valid() {
            return Err(LlmflowError::InvalidPipeline {
                pipeline: self.spec.name.clone(),
                reason: validation.errors.join("; "),
            });
        }

        let dag = DagBuilder::build(&self.spec)?;
        let order = dag.topological_order()?;

        Ok(Pipeline {
            spec: self.spec,
            steps: self.steps,
            order,
        })
    }
}
