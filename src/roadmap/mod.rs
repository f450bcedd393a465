// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Emissions roadmap pipeline
//!
//! Energy records (and optionally the text of a sustainability report) go in;
//! a Markdown roadmap with a scope 2 estimate and a ranked action plan comes
//! out. Steps and their dependencies:
//!
//! ```text
//! extract ──┬── retrieve_context ──────────┐
//!           └── calculate ── advise ───────┴── write
//! ```

pub mod calculators;
mod schemas;
pub mod steps;

pub use schemas::{
    ActionCategory, ActionPlanItem, Effort, EmissionBreakdown, EmissionFactors, RoadmapReport,
};

use crate::errors::{LlmflowError, LlmflowResult};
use crate::pipeline::Pipeline;
use crate::state::{MessageLog, PipelineState};
use crate::table::Table;
use steps::{AdviseStep, CalculateStep, ExtractStep, RetrieveContextStep, WriteStep};

/// Run state of the roadmap pipeline
#[derive(Debug, Clone, Default)]
pub struct RoadmapState {
    /// What the user wants to focus on; also the retrieval query
    pub user_request: Option<String>,
    /// Extracted report text
    pub report_text: Option<String>,
    /// Energy usage records (`kwh`, optional `renewable_kwh`)
    pub energy: Option<Table>,
    /// Defaults to the configured grid intensity when unset
    pub factors: Option<EmissionFactors>,
    pub context_snippets: Option<Vec<String>>,
    pub breakdown: Option<EmissionBreakdown>,
    pub renewable_share: Option<f64>,
    pub actions: Option<Vec<ActionPlanItem>>,
    pub report: Option<RoadmapReport>,
    pub messages: MessageLog,
}

impl RoadmapState {
    pub fn new(energy: Table) -> Self {
        Self {
            energy: Some(energy),
            ..Default::default()
        }
    }

    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.user_request = Some(request.into());
        self
    }

    pub fn with_report_text(mut self, text: impl Into<String>) -> Self {
        self.report_text = Some(text.into());
        self
    }

    pub fn with_factors(mut self, factors: EmissionFactors) -> Self {
        self.factors = Some(factors);
        self
    }

    pub fn into_report(self) -> LlmflowResult<RoadmapReport> {
        self.report
            .ok_or_else(|| LlmflowError::missing("write", "report"))
    }
}

impl PipelineState for RoadmapState {
    fn messages(&self) -> &MessageLog {
        &self.messages
    }

    fn messages_mut(&mut self) -> &mut MessageLog {
        &mut self.messages
    }
}

/// The roadmap pipeline
pub fn pipeline() -> LlmflowResult<Pipeline<RoadmapState>> {
    Pipeline::builder("roadmap")
        .description("Estimate scope 2 emissions and draft a net-zero roadmap")
        .then(ExtractStep)
        .after(&["extract"], RetrieveContextStep)
        .after(&["extract"], CalculateStep)
        .after(&["calculate"], AdviseStep)
        .after(&["advise", "retrieve_context"], WriteStep)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::llm::testing::ScriptedClient;
    use crate::pipeline::{PipelineExecutor, StepContext};
    use std::sync::Arc;

    fn energy() -> Table {
        Table::from_json_records(
            r#"[
                {" KWh ": "1000", "Renewable_kWh": 200, "site": "HQ"},
                {" KWh ": 500, "Renewable_kWh": "100", "site": "Depot"}
            ]"#,
        )
        .unwrap()
    }

    fn executor(client: Arc<ScriptedClient>, llm_suggestions: bool) -> PipelineExecutor {
        let mut settings = Settings::default();
        settings.roadmap.llm_suggestions = llm_suggestions;
        PipelineExecutor::new(StepContext::new(client, settings))
    }

    #[test]
    fn test_plan_respects_dependencies() {
        assert_eq!(
            pipeline().unwrap().plan(),
            vec!["extract", "retrieve_context", "calculate", "advise", "write"]
        );
    }

    #[tokio::test]
    async fn test_offline_roadmap() {
        let client = Arc::new(ScriptedClient::new(Vec::<String>::new()));
        let state = RoadmapState::new(energy()).with_factors(EmissionFactors {
            grid_intensity_kg_per_kwh: 0.5,
        });

        let report = executor(client.clone(), false)
            .execute(&pipeline().unwrap(), state)
            .await
            .unwrap();

        assert_eq!(client.call_count(), 0);
        assert!(report.state.messages.contains("Scope 2 = 600 kg CO2; renewable share = 20.0%"));
        let share = report.state.renewable_share.unwrap();
        assert!((share - 0.2).abs() < 1e-9);

        let roadmap = report.state.into_report().unwrap();
        assert!((roadmap.breakdown.scope2_kgco2 - 600.0).abs() < 1e-9);
        assert_eq!(roadmap.actions.len(), 2);
        assert!(roadmap.summary_md.starts_with("# NetZero Roadmap"));
        assert!(roadmap
            .summary_md
            .contains("1. **Increase renewable procurement to 50%** (renewables)"));
    }

    #[tokio::test]
    async fn test_model_suggestions_are_appended() {
        let client = Arc::new(ScriptedClient::new([
            "- Improve chiller efficiency\n- Buy certified green electricity",
        ]));

        let report = executor(client.clone(), true)
            .execute(&pipeline().unwrap(), RoadmapState::new(energy()))
            .await
            .unwrap();

        assert_eq!(client.call_count(), 1);
        let actions = report.state.actions.unwrap();
        assert_eq!(actions.len(), 4);
        assert_eq!(actions[2].category, ActionCategory::Efficiency);
        assert_eq!(actions[3].category, ActionCategory::Renewables);
    }

    #[tokio::test]
    async fn test_failed_suggestions_do_not_abort() {
        let client = Arc::new(ScriptedClient::failing("rate limited"));

        let report = executor(client, true)
            .execute(&pipeline().unwrap(), RoadmapState::new(energy()))
            .await
            .unwrap();

        assert!(report.state.messages.contains("Model suggestions skipped"));
        assert!(report.state.report.is_some());
    }

    #[tokio::test]
    async fn test_report_context_is_included() {
        let client = Arc::new(ScriptedClient::new(Vec::<String>::new()));
        let text = "Our headquarters switched to LED lighting in 2023.\n\n\
                    The depot still runs on diesel generators.";
        let state = RoadmapState::new(energy())
            .with_request("lighting upgrades")
            .with_report_text(text);

        let report = executor(client, false)
            .execute(&pipeline().unwrap(), state)
            .await
            .unwrap();

        let snippets = report.state.context_snippets.clone().unwrap();
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].contains("LED lighting"));
        assert!(report
            .state
            .into_report()
            .unwrap()
            .summary_md
            .contains("## Report Context"));
    }

    #[tokio::test]
    async fn test_missing_energy_is_bad_input() {
        let client = Arc::new(ScriptedClient::new(Vec::<String>::new()));

        let err = executor(client, false)
            .execute(&pipeline().unwrap(), RoadmapState::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::errors::ErrorKind::BadInput);
    }

    #[tokio::test]
    async fn test_columns_merged_by_normalization_are_rejected() {
        let client = Arc::new(ScriptedClient::new(Vec::<String>::new()));
        let energy =
            Table::from_json_records(r#"[{"KWh": 1000, " kwh ": 500}]"#).unwrap();

        let err = executor(client, false)
            .execute(&pipeline().unwrap(), RoadmapState::new(energy))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmflowError::InvalidTable { .. }));
        assert_eq!(err.kind(), crate::errors::ErrorKind::BadInput);
    }
}
