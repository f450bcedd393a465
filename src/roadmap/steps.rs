// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Emissions roadmap steps

use async_trait::async_trait;
use tracing::{info, warn};

use super::calculators::{
    coerce_number, electricity_kgco2, heuristic_actions, suggestions_from_bullets, KWH_COLUMN,
    RENEWABLE_KWH_COLUMN,
};
use super::{EmissionBreakdown, EmissionFactors, RoadmapReport, RoadmapState};
use crate::errors::{LlmflowError, LlmflowResult};
use crate::llm::prompts::ROADMAP_SUGGESTIONS;
use crate::llm::CompletionRequest;
use crate::pipeline::{Step, StepContext};
use crate::qa::{split_text, KeywordRetriever, Retriever};
use crate::state::require;

const REPORT_CHUNK_SIZE: usize = 1200;
const REPORT_CHUNK_OVERLAP: usize = 200;
const CONTEXT_SNIPPETS: usize = 4;
const SNIPPET_CHARS: usize = 500;

const REPORT_TITLE: &str = "NetZero Roadmap";

/// Normalize column names and numeric columns; settle the emission factors
pub struct ExtractStep;

#[async_trait]
impl Step<RoadmapState> for ExtractStep {
    fn name(&self) -> &str {
        "extract"
    }

    fn description(&self) -> &str {
        "Normalize energy records and emission factors"
    }

    async fn run(&self, state: &mut RoadmapState, ctx: &StepContext) -> LlmflowResult<()> {
        if state.factors.is_none() {
            state.factors = Some(EmissionFactors {
                grid_intensity_kg_per_kwh: ctx.settings.roadmap.grid_intensity_kg_per_kwh,
            });
        }

        let name = self.name();
        let energy = state
            .energy
            .as_mut()
            .ok_or_else(|| LlmflowError::missing(name, "energy"))?;

        energy.rename_columns(|c| c.trim().to_lowercase())?;
        for column in [KWH_COLUMN, RENEWABLE_KWH_COLUMN] {
            energy.map_column(column, coerce_number);
        }

        info!(
            rows = energy.len(),
            columns = energy.columns().len(),
            "Energy records normalized"
        );
        Ok(())
    }
}

/// Pull report passages relevant to the request
pub struct RetrieveContextStep;

#[async_trait]
impl Step<RoadmapState> for RetrieveContextStep {
    fn name(&self) -> &str {
        "retrieve_context"
    }

    fn description(&self) -> &str {
        "Select report passages relevant to the request"
    }

    async fn run(&self, state: &mut RoadmapState, _ctx: &StepContext) -> LlmflowResult<()> {
        let report = state.report_text.as_deref().unwrap_or("");
        if report.trim().is_empty() {
            state.context_snippets = Some(Vec::new());
            return Ok(());
        }

        let query = state
            .user_request
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or("summary");

        let chunks = split_text(report, REPORT_CHUNK_SIZE, REPORT_CHUNK_OVERLAP);
        let hits = KeywordRetriever.retrieve(query, &chunks, CONTEXT_SNIPPETS);
        let snippets: Vec<String> = hits
            .iter()
            .filter_map(|hit| chunks.iter().find(|c| c.index == hit.chunk_index))
            .map(|chunk| {
                chunk
                    .text
                    .replace('\n', " ")
                    .trim()
                    .chars()
                    .take(SNIPPET_CHARS)
                    .collect()
            })
            .collect();

        info!(snippets = snippets.len(), chunks = chunks.len(), "Report context retrieved");
        state.context_snippets = Some(snippets);
        Ok(())
    }
}

/// Compute scope 2 emissions and the renewable share
pub struct CalculateStep;

#[async_trait]
impl Step<RoadmapState> for CalculateStep {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Compute scope 2 emissions and renewable share"
    }

    async fn run(&self, state: &mut RoadmapState, _ctx: &StepContext) -> LlmflowResult<()> {
        let energy = require(&state.energy, self.name(), "energy")?;
        let factors = require(&state.factors, self.name(), "factors")?;

        let (scope2, share) = electricity_kgco2(energy, factors.grid_intensity_kg_per_kwh);

        let note = format!(
            "Scope 2 = {} kg CO2; renewable share = {:.1}%",
            thousands(scope2),
            share * 100.0
        );
        info!(scope2, share, "Emissions calculated");
        state.messages.push(note);
        state.breakdown = Some(EmissionBreakdown {
            scope2_kgco2: scope2,
            ..Default::default()
        });
        state.renewable_share = Some(share);
        Ok(())
    }
}

/// Heuristic action plan plus optional model suggestions
pub struct AdviseStep;

#[async_trait]
impl Step<RoadmapState> for AdviseStep {
    fn name(&self) -> &str {
        "advise"
    }

    fn description(&self) -> &str {
        "Draft the action plan"
    }

    async fn run(&self, state: &mut RoadmapState, ctx: &StepContext) -> LlmflowResult<()> {
        let breakdown = *require(&state.breakdown, self.name(), "breakdown")?;
        let share = *require(&state.renewable_share, self.name(), "renewable_share")?;
        let scope2 = breakdown.scope2_kgco2;

        let mut actions = heuristic_actions(scope2, share);
        let heuristic_count = actions.len();

        if ctx.settings.roadmap.llm_suggestions {
            let scope2_text = format!("{:.0}", scope2);
            let share_text = format!("{:.1}%", share * 100.0);
            let prompt = ROADMAP_SUGGESTIONS.render(&[
                ("scope2", scope2_text.as_str()),
                ("share", share_text.as_str()),
            ]);
            let request = CompletionRequest::prompt(prompt)
                .with_temperature(ctx.settings.roadmap.suggestion_temperature);

            match ctx.llm.complete(&request).await {
                Ok(text) => actions.extend(suggestions_from_bullets(&text, scope2)),
                Err(e) => {
                    warn!(error = %e, "Model suggestions skipped");
                    state
                        .messages
                        .push(format!("Model suggestions skipped: {}", e));
                }
            }
        }

        info!(
            heuristic = heuristic_count,
            suggested = actions.len() - heuristic_count,
            "Action plan drafted"
        );
        state.actions = Some(actions);
        Ok(())
    }
}

/// Render the Markdown report
pub struct WriteStep;

#[async_trait]
impl Step<RoadmapState> for WriteStep {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write the Markdown roadmap"
    }

    async fn run(&self, state: &mut RoadmapState, _ctx: &StepContext) -> LlmflowResult<()> {
        let breakdown = *require(&state.breakdown, self.name(), "breakdown")?;
        let actions = require(&state.actions, self.name(), "actions")?.clone();
        let snippets = state.context_snippets.clone().unwrap_or_default();

        let mut lines = vec![
            format!("# {}", REPORT_TITLE),
            String::new(),
            "## Summary".to_string(),
            format!(
                "- Estimated Scope 2 emissions: **{} kg CO₂**",
                thousands(breakdown.scope2_kgco2)
            ),
            format!(
                "- Total (Scopes 1+2+3): **{} kg CO₂**",
                thousands(breakdown.total_kgco2())
            ),
        ];
        if let Some(share) = state.renewable_share {
            lines.push(format!("- Renewable share of electricity: **{:.1}%**", share * 100.0));
        }

        lines.push(String::new());
        lines.push("## Recommended Actions".to_string());
        for (i, action) in actions.iter().enumerate() {
            lines.push(format!(
                "{}. **{}** ({}), effort: {}, est. reduction: **{} kg CO₂**, timeframe: {} mo.",
                i + 1,
                action.action,
                action.category,
                action.effort,
                thousands(action.est_reduction_kgco2),
                action.timeframe_months
            ));
            lines.push(format!("   - Rationale: {}", action.rationale));
        }

        if !snippets.is_empty() {
            lines.push(String::new());
            lines.push("## Report Context".to_string());
            for snippet in &snippets {
                lines.push(format!("> {}", snippet));
                lines.push(String::new());
            }
        }

        info!(actions = actions.len(), "Roadmap written");
        state.messages.push("Roadmap written.");
        state.report = Some(RoadmapReport {
            title: REPORT_TITLE.to_string(),
            summary_md: lines.join("\n").trim_end().to_string(),
            breakdown,
            actions,
        });
        Ok(())
    }
}

/// Round to a whole number and group digits with commas
pub fn thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0.0 && rounded != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(600.4), "600");
        assert_eq!(thousands(1234567.8), "1,234,568");
        assert_eq!(thousands(-12000.0), "-12,000");
    }
}
