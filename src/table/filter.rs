// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Ordered conjunctive row filters
//!
//! Rules apply in declaration order, each one narrowing the rows left by the
//! previous rule. A rule that names a column the table does not have is
//! skipped: it is logged at warn level and reported in
//! [`FilterOutcome::skipped`], and the row set is left as it was.
//!
//! Comparison rules:
//! - numbers compare numerically, integers and floats alike
//! - strings compare lexicographically
//! - booleans only compare for equality
//! - any other pairing (including a null cell) is incomparable: it fails
//!   `==`, `<`, `>`, `<=`, `>=` and passes `!=`

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::fmt;

use super::Table;

/// Comparison or membership operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
}

impl FilterOp {
    pub const ALL: [FilterOp; 8] = [
        FilterOp::Eq,
        FilterOp::Ne,
        FilterOp::Gt,
        FilterOp::Lt,
        FilterOp::Ge,
        FilterOp::Le,
        FilterOp::In,
        FilterOp::NotIn,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Gt => ">",
            FilterOp::Lt => "<",
            FilterOp::Ge => ">=",
            FilterOp::Le => "<=",
            FilterOp::In => "in",
            FilterOp::NotIn => "not in",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single comparable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Right-hand side of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl FilterValue {
    /// Membership candidates; a scalar acts as a one-element list
    fn candidates(&self) -> &[Scalar] {
        match self {
            FilterValue::Scalar(s) => std::slice::from_ref(s),
            FilterValue::List(items) => items,
        }
    }

    /// Scalar used by comparison operators; a list compares by its first item
    fn first(&self) -> Option<&Scalar> {
        self.candidates().first()
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Scalar(s) => write!(f, "{}", s),
            FilterValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(|s| s.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

/// One predicate over a named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRule {
    /// Exact column name
    pub column: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl FilterRule {
    pub fn new(column: &str, op: FilterOp, value: FilterValue) -> Self {
        Self {
            column: column.to_string(),
            op,
            value,
        }
    }

    /// Strict JSON Schema for one rule
    pub fn json_schema() -> Value {
        let scalar = json!({"type": ["string", "number", "boolean"]});
        json!({
            "type": "object",
            "properties": {
                "column": {"type": "string", "description": "Exact column name in the table"},
                "op": {
                    "type": "string",
                    "enum": FilterOp::ALL.iter().map(|op| op.symbol()).collect::<Vec<_>>()
                },
                "value": {
                    "anyOf": [scalar, {"type": "array", "items": scalar}],
                    "description": "Value or list of values to filter by"
                }
            },
            "required": ["column", "op", "value"],
            "additionalProperties": false
        })
    }

    /// Whether a cell satisfies this rule
    pub fn matches(&self, cell: &Value) -> bool {
        match self.op {
            FilterOp::Eq => self.value.first().is_some_and(|v| equal(cell, v)),
            FilterOp::Ne => !self.value.first().is_some_and(|v| equal(cell, v)),
            FilterOp::Gt => self.ordering(cell).is_some_and(|o| o == Ordering::Greater),
            FilterOp::Lt => self.ordering(cell).is_some_and(|o| o == Ordering::Less),
            FilterOp::Ge => self.ordering(cell).is_some_and(|o| o != Ordering::Less),
            FilterOp::Le => self.ordering(cell).is_some_and(|o| o != Ordering::Greater),
            FilterOp::In => self.contains(cell),
            FilterOp::NotIn => !self.contains(cell),
        }
    }

    fn ordering(&self, cell: &Value) -> Option<Ordering> {
        self.value.first().and_then(|v| compare(cell, v))
    }

    fn contains(&self, cell: &Value) -> bool {
        self.value.candidates().iter().any(|v| equal(cell, v))
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.value)
    }
}

fn equal(cell: &Value, value: &Scalar) -> bool {
    match (cell, value) {
        (Value::Bool(a), Scalar::Bool(b)) => a == b,
        (Value::String(a), Scalar::Text(b)) => a == b,
        _ => compare(cell, value) == Some(Ordering::Equal),
    }
}

fn compare(cell: &Value, value: &Scalar) -> Option<Ordering> {
    match (cell, value) {
        (Value::Number(a), Scalar::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Scalar::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

/// Filtered table plus the rules that were skipped
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub table: Table,
    /// Rules naming a column the table does not have
    pub skipped: Vec<FilterRule>,
}

/// Apply rules in order
pub fn apply_filters(table: &Table, rules: &[FilterRule]) -> FilterOutcome {
    let mut filtered = table.clone();
    let mut skipped = Vec::new();

    for rule in rules {
        let Some(idx) = filtered.column_index(&rule.column) else {
            tracing::warn!(
                column = %rule.column,
                rule = %rule,
                "Filter references unknown column; skipping rule"
            );
            skipped.push(rule.clone());
            continue;
        };

        let before = filtered.len();
        filtered.retain_rows(|row| rule.matches(&row[idx]));
        tracing::debug!(rule = %rule, before, after = filtered.len(), "Applied filter");
    }

    FilterOutcome {
        table: filtered,
        skipped,
    }
}
