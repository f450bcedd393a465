// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Vega-Lite rendering
//!
//! Produces a self-contained Vega-Lite v5 document with the (already
//! filtered) rows inlined as `data.values`.

use serde_json::{json, Map, Value};

use super::{Aggregate, ChartSpec, ChartType};
use crate::table::{infer_column_type, ColumnType, Table};

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Vega-Lite mark for a chart type
pub fn mark(chart_type: ChartType) -> &'static str {
    match chart_type {
        ChartType::Bar => "bar",
        ChartType::Line => "line",
        ChartType::Area => "area",
        ChartType::Scatter => "circle",
        ChartType::Pie => "arc",
    }
}

fn vega_aggregate(aggregate: Aggregate) -> &'static str {
    match aggregate {
        Aggregate::Sum => "sum",
        Aggregate::Avg => "mean",
        Aggregate::Count => "count",
        Aggregate::Min => "min",
        Aggregate::Max => "max",
    }
}

fn measurement(table: &Table, field: &str) -> &'static str {
    match table.column(field).map(infer_column_type) {
        Some(ColumnType::Int64) | Some(ColumnType::Float64) => "quantitative",
        _ => "nominal",
    }
}

fn field(table: &Table, name: &str) -> Value {
    json!({"field": name, "type": measurement(table, name)})
}

/// The measure channel: `aggregate(y)`, plain `y`, or a row count
fn measure(spec: &ChartSpec, table: &Table) -> Option<Value> {
    match (spec.y.as_deref(), spec.aggregate) {
        (Some(y), Some(agg)) => Some(json!({
            "field": y,
            "aggregate": vega_aggregate(agg),
            "type": "quantitative"
        })),
        (Some(y), None) => Some(field(table, y)),
        (None, Some(Aggregate::Count)) => Some(json!({
            "aggregate": "count",
            "type": "quantitative"
        })),
        (None, _) => None,
    }
}

/// Render a chart plan against the rows it should display
pub fn render(spec: &ChartSpec, table: &Table) -> Value {
    let mut encoding = Map::new();

    if spec.chart_type == ChartType::Pie {
        let theta = measure(spec, table)
            .unwrap_or_else(|| json!({"aggregate": "count", "type": "quantitative"}));
        encoding.insert("theta".into(), theta);
        let category = spec.color.as_deref().unwrap_or(&spec.x);
        encoding.insert("color".into(), field(table, category));
    } else {
        encoding.insert("x".into(), field(table, &spec.x));
        if let Some(y) = measure(spec, table) {
            encoding.insert("y".into(), y);
        }
        if let Some(color) = spec.color.as_deref() {
            encoding.insert("color".into(), field(table, color));
        }
    }

    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "data": {"values": table.to_records()},
        "mark": {"type": mark(spec.chart_type)},
        "encoding": Value::Object(encoding)
    })
}
