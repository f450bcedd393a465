// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Chart pipeline steps

use async_trait::async_trait;
use tracing::{info, warn};

use super::{vega, ChartSpec, ChartState};
use crate::artifact::{correct_once, generate, Correction, StructuredArtifact};
use crate::errors::{LlmflowError, LlmflowResult};
use crate::llm::prompts::{CHART_CORRECTION, CHART_PLAN};
use crate::llm::CompletionRequest;
use crate::pipeline::{Step, StepContext};
use crate::state::{require, require_text};
use crate::table::{apply_filters, summarize};

/// Describe the table's columns for the planner prompt
pub struct SummarizeSchemaStep;

#[async_trait]
impl Step<ChartState> for SummarizeSchemaStep {
    fn name(&self) -> &str {
        "summarize_schema"
    }

    fn description(&self) -> &str {
        "Summarize column names, types and sample values"
    }

    async fn run(&self, state: &mut ChartState, _ctx: &StepContext) -> LlmflowResult<()> {
        let table = require(&state.table, self.name(), "table")?;
        if table.is_empty() {
            return Err(LlmflowError::missing(self.name(), "table rows"));
        }

        state.schema_summary = Some(summarize(table));
        state.messages.push("Schema summarized.");
        info!(columns = table.columns().len(), rows = table.len(), "Schema summarized");
        Ok(())
    }
}

/// Turn the request into a [`ChartSpec`] with one constrained call
pub struct ParseRequestStep;

#[async_trait]
impl Step<ChartState> for ParseRequestStep {
    fn name(&self) -> &str {
        "parse_request"
    }

    fn description(&self) -> &str {
        "Plan the chart from the request"
    }

    async fn run(&self, state: &mut ChartState, ctx: &StepContext) -> LlmflowResult<()> {
        let request = require_text(&state.user_request, self.name(), "user_request")?;
        let schema = require_text(&state.schema_summary, self.name(), "schema_summary")?;

        let prompt = CHART_PLAN.render(&[("schema", schema), ("request", request)]);
        let spec: ChartSpec = generate(
            ctx.llm.as_ref(),
            CompletionRequest::prompt(prompt).with_temperature(ctx.settings.llm.temperature),
        )
        .await?;

        let compact = serde_json::to_string(&spec)?;
        state.messages.push(format!("Parsed spec: {}", compact));
        info!(chart_type = %spec.chart_type, x = %spec.x, "Parsed chart spec");
        state.chart_spec = Some(spec);
        Ok(())
    }
}

/// Check column references and request at most one correction
pub struct CriticStep;

#[async_trait]
impl Step<ChartState> for CriticStep {
    fn name(&self) -> &str {
        "critic"
    }

    fn description(&self) -> &str {
        "Verify referenced columns, correcting the plan once if needed"
    }

    async fn run(&self, state: &mut ChartState, ctx: &StepContext) -> LlmflowResult<()> {
        let spec = require(&state.chart_spec, self.name(), "chart_spec")?;
        let table = require(&state.table, self.name(), "table")?;
        let schema = require_text(&state.schema_summary, self.name(), "schema_summary")?;

        let violations = spec.violations(table.columns());
        if violations.is_empty() {
            state.messages.push("Critic: ok.");
            info!("Critic: ok");
            return Ok(());
        }

        info!(violations = violations.len(), "Requesting one corrective call");
        let listed: Vec<String> = violations.iter().map(|v| format!("- {}", v)).collect();
        let listed = listed.join("\n");
        let invalid = spec.to_pretty_json();
        let prompt = CHART_CORRECTION.render(&[
            ("schema", schema),
            ("spec", invalid.as_str()),
            ("violations", listed.as_str()),
        ]);
        let request =
            CompletionRequest::prompt(prompt).with_temperature(ctx.settings.llm.temperature);

        match correct_once::<ChartSpec>(ctx.llm.as_ref(), request).await? {
            Correction::Replaced(corrected) => {
                info!(x = %corrected.x, "Critic corrected spec");
                state.chart_spec = Some(corrected);
                state.messages.push("Critic corrected spec.");
            }
            Correction::Rejected { reason } => {
                warn!(%reason, "Corrective response unusable; keeping original spec");
                state.messages.push(format!(
                    "Critic could not correct the spec ({}); keeping the original. Unresolved: {}.",
                    reason,
                    violations.join("; ")
                ));
            }
        }

        Ok(())
    }
}

/// Apply filters and render Vega-Lite
pub struct BuildVegaStep;

#[async_trait]
impl Step<ChartState> for BuildVegaStep {
    fn name(&self) -> &str {
        "build_vega"
    }

    fn description(&self) -> &str {
        "Filter the rows and render a Vega-Lite spec"
    }

    async fn run(&self, state: &mut ChartState, _ctx: &StepContext) -> LlmflowResult<()> {
        let spec = require(&state.chart_spec, self.name(), "chart_spec")?;
        let table = require(&state.table, self.name(), "table")?;

        let outcome = apply_filters(table, &spec.filters);

        for field in std::iter::once(&spec.x).chain(spec.y.as_ref()) {
            if !outcome.table.has_column(field) {
                return Err(LlmflowError::Generation {
                    message: format!("spec invalid for data: column '{}' not in table", field),
                    help: Some(format!(
                        "Available columns: {}",
                        outcome.table.columns().join(", ")
                    )),
                });
            }
        }

        let rendered = vega::render(spec, &outcome.table);

        for rule in &outcome.skipped {
            state
                .messages
                .push(format!("Filter skipped, unknown column: {}", rule));
        }
        info!(rows = outcome.table.len(), skipped = outcome.skipped.len(), "Vega spec built");
        state.skipped_filters = outcome.skipped;
        state.vega_spec = Some(rendered);
        state.messages.push("Vega spec built.");
        Ok(())
    }
}
