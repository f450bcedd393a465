// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Chart planning pipeline
//!
//! `summarize_schema → parse_request → critic → build_vega`
//!
//! The planner turns a request into a [`ChartSpec`], the critic checks every
//! column reference against the table and may ask for one correction, and
//! the renderer filters the rows and emits Vega-Lite.

mod spec;
pub mod steps;
pub mod vega;

pub use spec::{Aggregate, ChartSpec, ChartType};

use serde::Serialize;
use serde_json::Value;

use crate::errors::{LlmflowError, LlmflowResult};
use crate::pipeline::Pipeline;
use crate::state::{MessageLog, PipelineState};
use crate::table::{FilterRule, Table};
use steps::{BuildVegaStep, CriticStep, ParseRequestStep, SummarizeSchemaStep};

/// Run state of the chart pipeline
#[derive(Debug, Clone, Default)]
pub struct ChartState {
    /// Natural-language request
    pub user_request: Option<String>,
    /// Source rows
    pub table: Option<Table>,
    /// Column summary sent to the planner
    pub schema_summary: Option<String>,
    /// Current plan
    pub chart_spec: Option<ChartSpec>,
    /// Rendered Vega-Lite document
    pub vega_spec: Option<Value>,
    /// Filters ignored because their column does not exist
    pub skipped_filters: Vec<FilterRule>,
    pub messages: MessageLog,
}

impl ChartState {
    pub fn new(table: Table, user_request: impl Into<String>) -> Self {
        Self {
            user_request: Some(user_request.into()),
            table: Some(table),
            ..Default::default()
        }
    }

    /// Final output of a completed run
    pub fn into_output(self) -> LlmflowResult<ChartOutput> {
        let spec = self
            .chart_spec
            .ok_or_else(|| LlmflowError::missing("build_vega", "chart_spec"))?;
        let vega = self
            .vega_spec
            .ok_or_else(|| LlmflowError::missing("build_vega", "vega_spec"))?;

        Ok(ChartOutput {
            spec,
            vega,
            skipped_filters: self.skipped_filters,
            messages: self.messages,
        })
    }
}

impl PipelineState for ChartState {
    fn messages(&self) -> &MessageLog {
        &self.messages
    }

    fn messages_mut(&mut self) -> &mut MessageLog {
        &mut self.messages
    }
}

/// Plan, rendered chart and run notes
#[derive(Debug, Clone, Serialize)]
pub struct ChartOutput {
    pub spec: ChartSpec,
    pub vega: Value,
    pub skipped_filters: Vec<FilterRule>,
    pub messages: MessageLog,
}

/// The chart pipeline
pub fn pipeline() -> LlmflowResult<Pipeline<ChartState>> {
    Pipeline::builder("chart")
        .description("Plan, validate and render a chart from tabular data")
        .then(SummarizeSchemaStep)
        .then(ParseRequestStep)
        .then(CriticStep)
        .then(BuildVegaStep)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::llm::testing::ScriptedClient;
    use crate::pipeline::{PipelineExecutor, StepContext};
    use std::sync::Arc;

    fn sales() -> Table {
        Table::from_json_records(
            r#"[
                {"region": "EU", "sales": 120},
                {"region": "US", "sales": 95},
                {"region": "EU", "sales": 30}
            ]"#,
        )
        .unwrap()
    }

    async fn run_with(
        client: Arc<ScriptedClient>,
        state: ChartState,
    ) -> LlmflowResult<ChartState> {
        let executor = PipelineExecutor::new(StepContext::new(client, Settings::default()));
        executor
            .execute(&pipeline()?, state)
            .await
            .map(|report| report.state)
    }

    #[test]
    fn test_pipeline_order() {
        assert_eq!(
            pipeline().unwrap().plan(),
            vec!["summarize_schema", "parse_request", "critic", "build_vega"]
        );
    }

    #[tokio::test]
    async fn test_valid_plan_needs_no_correction() {
        let client = Arc::new(ScriptedClient::new([
            r#"{"chart_type": "bar", "x": "region", "y": "sales", "aggregate": "sum"}"#,
        ]));

        let state = run_with(
            client.clone(),
            ChartState::new(sales(), "Bar chart of total sales by region"),
        )
        .await
        .unwrap();

        let spec = state.chart_spec.clone().unwrap();
        let mut expected = ChartSpec::new(ChartType::Bar, "region", Some("sales"));
        expected.aggregate = Some(Aggregate::Sum);
        assert_eq!(spec, expected);

        assert_eq!(client.call_count(), 1);
        assert!(state.messages.contains("Critic: ok."));
        let vega = state.vega_spec.unwrap();
        assert_eq!(vega["encoding"]["y"]["aggregate"], "sum");
    }

    #[tokio::test]
    async fn test_one_corrective_call_fixes_column() {
        let client = Arc::new(ScriptedClient::new([
            r#"{"chart_type": "bar", "x": "country", "y": "sales"}"#,
            r#"{"chart_type": "bar", "x": "region", "y": "sales"}"#,
        ]));

        let state = run_with(client.clone(), ChartState::new(sales(), "Sales by country"))
            .await
            .unwrap();

        assert_eq!(client.call_count(), 2);
        assert_eq!(state.chart_spec.as_ref().map(|s| s.x.as_str()), Some("region"));
        assert!(state.messages.contains("Critic corrected spec."));

        let requests = client.requests();
        assert_eq!(
            requests[1].response_schema.as_ref().map(|s| s.name.as_str()),
            Some("ChartSpec")
        );
        let correction = requests[1].text();
        assert!(correction.contains("x 'country' not found"));
        assert!(correction.contains("region (object)"));
        assert!(correction.contains("\"country\""));
    }

    #[tokio::test]
    async fn test_unparseable_correction_keeps_original() {
        let client = Arc::new(ScriptedClient::new([
            r#"{"chart_type": "bar", "x": "country", "y": "sales"}"#,
            "I think you meant region.",
        ]));
        let state = ChartState::new(sales(), "Sales by country");

        // stop after the critic so the invalid plan can be inspected
        let partial = Pipeline::builder("plan-only")
            .then(SummarizeSchemaStep)
            .then(ParseRequestStep)
            .then(CriticStep)
            .build()
            .unwrap();
        let executor =
            PipelineExecutor::new(StepContext::new(client.clone(), Settings::default()));
        let state = executor.execute(&partial, state).await.unwrap().state;

        assert_eq!(client.call_count(), 2);
        assert_eq!(
            state.chart_spec,
            Some(ChartSpec::new(ChartType::Bar, "country", Some("sales")))
        );
        assert!(state.messages.contains("keeping the original"));
    }

    #[tokio::test]
    async fn test_uncorrected_plan_fails_at_render() {
        let client = Arc::new(ScriptedClient::new([
            r#"{"chart_type": "bar", "x": "country", "y": "sales"}"#,
            r#"{"chart_type": "bar", "x": "country", "y": "sales", "legend": true}"#,
        ]));

        let err = run_with(client.clone(), ChartState::new(sales(), "Sales by country"))
            .await
            .unwrap_err();

        assert_eq!(client.call_count(), 2);
        assert_eq!(err.kind(), crate::errors::ErrorKind::Generation);
    }

    #[tokio::test]
    async fn test_many_violations_still_one_call() {
        let client = Arc::new(ScriptedClient::new([
            r#"{"chart_type": "line", "x": "month", "y": "revenue", "color": "product",
                "filters": [{"column": "year", "op": "==", "value": 2024}]}"#,
            "not json",
        ]));

        let _ = run_with(client.clone(), ChartState::new(sales(), "Revenue by month")).await;

        assert_eq!(client.call_count(), 2);
        let requests = client.requests();
        assert_eq!(
            requests[1].response_schema.as_ref().map(|s| s.name.as_str()),
            Some("ChartSpec")
        );
        let correction = requests[1].text();
        assert!(correction.contains("filter column 'year' not found"));
    }

    #[tokio::test]
    async fn test_empty_request_makes_no_call() {
        let client = Arc::new(ScriptedClient::new(Vec::<String>::new()));

        let err = run_with(client.clone(), ChartState::new(sales(), "   "))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmflowError::MissingPrecondition { .. }));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_table_is_rejected() {
        let client = Arc::new(ScriptedClient::new(Vec::<String>::new()));
        let empty = Table::from_json_records("[]").unwrap();

        let err = run_with(client.clone(), ChartState::new(empty, "anything"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::errors::ErrorKind::BadInput);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_filter_column_is_reported() {
        let client = Arc::new(ScriptedClient::new([
            r#"{"chart_type": "bar", "x": "region", "y": "sales",
                "filters": [{"column": "sales", "op": ">", "value": 50},
                            {"column": "year", "op": "==", "value": 2024}]}"#,
            // corrective reply drops nothing; the renderer skips the unknown rule
            r#"{"chart_type": "bar", "x": "region", "y": "sales",
                "filters": [{"column": "sales", "op": ">", "value": 50},
                            {"column": "year", "op": "==", "value": 2024}]}"#,
        ]));

        let output = run_with(client, ChartState::new(sales(), "Big sales by region"))
            .await
            .unwrap()
            .into_output()
            .unwrap();

        assert_eq!(output.skipped_filters.len(), 1);
        assert_eq!(output.vega["data"]["values"].as_array().map(|v| v.len()), Some(2));
        assert!(output.messages.contains("Filter skipped"));
    }
}
