// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Pipeline executor
//!
//! Runs the steps of a pipeline strictly in their fixed order against one
//! state. The first failing step aborts the run; its error is returned and the
//! partially built state is dropped.

use std::time::{Duration, Instant};

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::LlmflowResult;
use crate::pipeline::{Pipeline, StepContext};
use crate::state::PipelineState;
use crate::utils::create_spinner;

/// Pipeline execution options
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Show a spinner per step on the terminal
    pub show_progress: bool,
}

/// One executed step
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: String,
    pub duration: Duration,
}

/// Result of a successful run
#[derive(Debug)]
pub struct RunReport<S> {
    /// Identifies this run in logs
    pub run_id: Uuid,
    /// Final state
    pub state: S,
    /// Executed steps, in execution order
    pub trace: Vec<StepRecord>,
    /// Total execution time
    pub duration: Duration,
}

impl<S> RunReport<S> {
    /// Names of the executed steps, in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.trace.iter().map(|r| r.name.as_str()).collect()
    }
}

/// Pipeline executor
///
/// Holds the collaborators shared by every step. One executor can serve any
/// number of runs; runs share no mutable state.
pub struct PipelineExecutor {
    ctx: StepContext,
    options: ExecutionOptions,
}

impl PipelineExecutor {
    /// Create a new pipeline executor
    pub fn new(ctx: StepContext) -> Self {
        Self {
            ctx,
            options: ExecutionOptions::default(),
        }
    }

    /// Set execution options
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn context(&self) -> &StepContext {
        &self.ctx
    }

    /// Execute a pipeline against an initial state
    pub async fn execute<S: PipelineState>(
        &self,
        pipeline: &Pipeline<S>,
        mut state: S,
    ) -> LlmflowResult<RunReport<S>> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let run_span = info_span!("pipeline", pipeline = pipeline.name(), run_id = %run_id);

        let mut trace = Vec::new();

        for step in pipeline.ordered_steps() {
            let step_start = Instant::now();
            let spinner = self
                .options
                .show_progress
                .then(|| create_spinner(&format!("{}...", step.name())));

            let result = step
                .run(&mut state, &self.ctx)
                .instrument(info_span!(parent: &run_span, "step", name = step.name()))
                .await;

            let elapsed = step_start.elapsed();

            if let Err(e) = result {
                if let Some(pb) = spinner {
                    pb.finish_and_clear();
                    crate::utils::print_error(&format!("{} failed", step.name()));
                }
                warn!(
                    parent: &run_span,
                    step = step.name(),
                    error = %e,
                    "Step failed; aborting run"
                );
                return Err(e);
            }

            if let Some(pb) = spinner {
                pb.finish_and_clear();
                crate::utils::print_success(&format!(
                    "{} ({:.2}s)",
                    step.name(),
                    elapsed.as_secs_f64()
                ));
            }

            trace.push(StepRecord {
                name: step.name().to_string(),
                duration: elapsed,
            });
        }

        let duration = start.elapsed();
        info!(
            parent: &run_span,
            steps = trace.len(),
            elapsed_ms = duration.as_millis() as u64,
            "Pipeline completed"
        );

        Ok(RunReport {
            run_id,
            state,
            trace,
            duration,
        })
    }
}
