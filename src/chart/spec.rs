// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Chart plan produced by the model

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::artifact::StructuredArtifact;
use crate::table::FilterRule;

/// Kind of chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Area,
    Scatter,
    Pie,
}

impl ChartType {
    pub const ALL: [ChartType; 5] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Area,
        ChartType::Scatter,
        ChartType::Pie,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Scatter => "scatter",
            ChartType::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation applied to the y field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl Aggregate {
    pub const ALL: [Aggregate; 5] = [
        Aggregate::Sum,
        Aggregate::Avg,
        Aggregate::Count,
        Aggregate::Min,
        Aggregate::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Count => "count",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chart plan over one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub x: String,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub aggregate: Option<Aggregate>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterRule>,
}

impl ChartSpec {
    /// Shorthand for a plan without color or filters
    pub fn new(chart_type: ChartType, x: &str, y: Option<&str>) -> Self {
        Self {
            chart_type,
            x: x.to_string(),
            y: y.map(str::to_string),
            aggregate: None,
            color: None,
            filters: Vec::new(),
        }
    }

    /// References to columns missing from `columns`, one line each
    pub fn violations(&self, columns: &[String]) -> Vec<String> {
        let known = |name: &str| columns.iter().any(|c| c == name);
        let mut found = Vec::new();

        if !known(self.x.as_str()) {
            found.push(format!("x '{}' not found", self.x));
        }
        if let Some(y) = self.y.as_deref().filter(|y| !known(*y)) {
            found.push(format!("y '{}' not found", y));
        }
        if let Some(color) = self.color.as_deref().filter(|c| !known(*c)) {
            found.push(format!("color '{}' not found", color));
        }
        for rule in self.filters.iter().filter(|r| !known(r.column.as_str())) {
            found.push(format!("filter column '{}' not found", rule.column));
        }

        found
    }
}

impl StructuredArtifact for ChartSpec {
    const NAME: &'static str = "ChartSpec";

    fn json_schema() -> Value {
        let nullable_string = json!({"type": ["string", "null"]});
        let mut aggregates: Vec<Value> = Aggregate::ALL.iter().map(|a| json!(a.as_str())).collect();
        aggregates.push(Value::Null);

        json!({
            "type": "object",
            "properties": {
                "chart_type": {
                    "type": "string",
                    "enum": ChartType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>()
                },
                "x": {"type": "string", "description": "Column for the x axis"},
                "y": nullable_string,
                "aggregate": {"type": ["string", "null"], "enum": aggregates},
                "color": nullable_string,
                "filters": {"type": "array", "items": FilterRule::json_schema()}
            },
            "required": ["chart_type", "x", "y", "aggregate", "color", "filters"],
            "additionalProperties": false
        })
    }
}
