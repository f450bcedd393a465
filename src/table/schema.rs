// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Column type inference and schema summaries for prompts

use serde_json::Value;
use std::fmt;

use super::Table;

/// Samples shown per column in a summary
const SAMPLES_PER_COLUMN: usize = 3;

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    Bool,
    /// Strings, mixed values, or no values at all
    Object,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int64 => write!(f, "int64"),
            ColumnType::Float64 => write!(f, "float64"),
            ColumnType::Bool => write!(f, "bool"),
            ColumnType::Object => write!(f, "object"),
        }
    }
}

/// Infer a column type from its cells, ignoring nulls
pub fn infer_column_type<'a>(cells: impl Iterator<Item = &'a Value>) -> ColumnType {
    let mut inferred: Option<ColumnType> = None;

    for cell in cells {
        let this = match cell {
            Value::Null => continue,
            Value::Bool(_) => ColumnType::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => ColumnType::Int64,
            Value::Number(_) => ColumnType::Float64,
            _ => return ColumnType::Object,
        };

        inferred = Some(match (inferred, this) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(ColumnType::Int64), ColumnType::Float64)
            | (Some(ColumnType::Float64), ColumnType::Int64) => ColumnType::Float64,
            _ => return ColumnType::Object,
        });
    }

    inferred.unwrap_or(ColumnType::Object)
}

/// One line per column, `col (dtype), samples=[a, b, c]`, joined by ` | `
pub fn summarize(table: &Table) -> String {
    table
        .columns()
        .iter()
        .map(|name| {
            let dtype = table
                .column(name)
                .map(infer_column_type)
                .unwrap_or(ColumnType::Object);
            let samples: Vec<String> = table
                .column(name)
                .into_iter()
                .flatten()
                .filter(|v| !v.is_null())
                .take(SAMPLES_PER_COLUMN)
                .map(render_sample)
                .collect();
            format!("{} ({}), samples=[{}]", name, dtype, samples.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn render_sample(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
