// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! In-memory tables
//!
//! A [`Table`] is an ordered list of column names plus rows of scalar JSON
//! cells. Tables are read from "records" documents (an array of objects where
//! each object is one row) or from CSV with a header row. Column order is the
//! order in which names are first seen; a record that omits a column gets a
//! null cell. Column names are unique.

mod filter;
mod schema;

pub use filter::{apply_filters, FilterOp, FilterOutcome, FilterRule, FilterValue, Scalar};
pub use schema::{infer_column_type, summarize, ColumnType};

use serde_json::{Map, Value};
use std::path::Path;

use crate::errors::{LlmflowError, LlmflowResult};

/// Tabular data with named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from columns and rows; every row must match the column count
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> LlmflowResult<Self> {
        if let Some(name) = duplicate_column(&columns) {
            return Err(LlmflowError::InvalidTable {
                reason: format!("duplicate column '{}'", name),
            });
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(LlmflowError::InvalidTable {
                reason: format!(
                    "row {} has {} cells but there are {} columns",
                    i,
                    row.len(),
                    columns.len()
                ),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Parse a JSON array of records
    pub fn from_json_records(json: &str) -> LlmflowResult<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| LlmflowError::InvalidTable {
            reason: format!("not valid JSON: {}", e),
        })?;
        Self::from_value(value)
    }

    /// Parse a YAML sequence of mappings
    pub fn from_yaml_records(yaml: &str) -> LlmflowResult<Self> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| LlmflowError::InvalidTable {
            reason: format!("not valid YAML: {}", e),
        })?;
        Self::from_value(value)
    }

    /// Parse CSV with a header row
    ///
    /// Cells are typed the way a data-frame reader would: integers, floats and
    /// `true`/`false` become JSON scalars, empty cells become null, anything
    /// else stays a string.
    pub fn from_csv(content: &str) -> LlmflowResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(csv_cell).collect());
        }

        Self::new(columns, rows)
    }

    /// Load a table file, choosing the format by extension
    pub fn load(path: &Path) -> LlmflowResult<Self> {
        if !path.exists() {
            return Err(LlmflowError::FileNotFound {
                path: path.to_path_buf(),
                help: Some("Pass a .csv file or a .json/.yaml file of records".into()),
            });
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let content =
            std::fs::read_to_string(path).map_err(|e| LlmflowError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        let table = match extension.as_deref() {
            Some("json") => Self::from_json_records(&content)?,
            Some("yaml") | Some("yml") => Self::from_yaml_records(&content)?,
            Some("csv") => Self::from_csv(&content)?,
            _ => {
                return Err(LlmflowError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        tracing::debug!(
            path = %path.display(),
            rows = table.len(),
            columns = table.columns.len(),
            "Loaded table"
        );
        Ok(table)
    }

    fn from_value(value: Value) -> LlmflowResult<Self> {
        let records = match value {
            Value::Array(records) => records,
            other => {
                return Err(LlmflowError::InvalidTable {
                    reason: format!("expected an array of records, found {}", type_name(&other)),
                })
            }
        };

        let mut objects = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            match record {
                Value::Object(map) => objects.push(map),
                other => {
                    return Err(LlmflowError::InvalidTable {
                        reason: format!("record {} is {}, not an object", i, type_name(&other)),
                    })
                }
            }
        }

        Self::from_records(objects)
    }

    /// Build a table from record maps
    pub fn from_records(records: Vec<Map<String, Value>>) -> LlmflowResult<Self> {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(records.len());
        for (i, mut record) in records.into_iter().enumerate() {
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                let cell = record.remove(column).unwrap_or(Value::Null);
                if cell.is_array() || cell.is_object() {
                    return Err(LlmflowError::InvalidTable {
                        reason: format!(
                            "record {} column '{}' holds a nested value; cells must be scalars",
                            i, column
                        ),
                    });
                }
                row.push(cell);
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Keep rows for which `keep` returns true
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Rename every column
    ///
    /// Fails, leaving the table untouched, when two columns would end up with
    /// the same name.
    pub fn rename_columns<F>(&mut self, mut rename: F) -> LlmflowResult<()>
    where
        F: FnMut(&str) -> String,
    {
        let renamed: Vec<String> = self.columns.iter().map(|c| rename(c)).collect();
        if let Some(name) = duplicate_column(&renamed) {
            return Err(LlmflowError::InvalidTable {
                reason: format!("renaming columns produces duplicate column '{}'", name),
            });
        }
        self.columns = renamed;
        Ok(())
    }

    /// Replace every cell of one column; returns false when the column is absent
    pub fn map_column<F>(&mut self, name: &str, mut map: F) -> bool
    where
        F: FnMut(&Value) -> Value,
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            row[idx] = map(&row[idx]);
        }
        true
    }

    /// Rows as JSON objects, columns in table order
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let map: Map<String, Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                Value::Object(map)
            })
            .collect()
    }
}

fn duplicate_column(columns: &[String]) -> Option<&str> {
    columns
        .iter()
        .enumerate()
        .find(|(i, c)| columns[..*i].contains(c))
        .map(|(_, c)| c.as_str())
}

fn csv_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        return Value::Number(n);
    }
    match raw {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn csv_error(e: csv::Error) -> LlmflowError {
    LlmflowError::InvalidTable {
        reason: format!("not valid CSV: {}", e),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_keep_first_seen_column_order() {
        let table = Table::from_json_records(
            r#"[{"region": "EU", "sales": 10}, {"sales": 5, "region": "US", "product": "A"}]"#,
        )
        .unwrap();

        assert_eq!(table.columns(), &["region", "sales", "product"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][2], Value::Null);
        assert_eq!(table.rows()[1][0], json!("US"));
    }

    #[test]
    fn test_yaml_records() {
        let table = Table::from_yaml_records("- kwh: 1000\n  site: A\n- kwh: 500\n  site: B\n")
            .unwrap();
        assert_eq!(table.columns(), &["kwh", "site"]);
        let kwh: Vec<_> = table.column("kwh").unwrap().cloned().collect();
        assert_eq!(kwh, vec![json!(1000), json!(500)]);
    }

    #[test]
    fn test_rejects_non_records() {
        let err = Table::from_json_records(r#"{"region": "EU"}"#).unwrap_err();
        assert!(matches!(err, LlmflowError::InvalidTable { .. }));

        let err = Table::from_json_records(r#"[{"region": ["EU"]}]"#).unwrap_err();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("sales.json");
        std::fs::write(&json_path, r#"[{"region": "EU", "sales": 10}]"#).unwrap();
        assert_eq!(Table::load(&json_path).unwrap().len(), 1);

        let csv_path = dir.path().join("sales.csv");
        std::fs::write(&csv_path, "region,sales\nEU,10\n").unwrap();
        assert_eq!(Table::load(&csv_path).unwrap().columns(), &["region", "sales"]);

        let xlsx_path = dir.path().join("sales.xlsx");
        std::fs::write(&xlsx_path, "binary").unwrap();
        assert!(matches!(
            Table::load(&xlsx_path),
            Err(LlmflowError::UnsupportedFormat { .. })
        ));

        assert!(matches!(
            Table::load(&dir.path().join("missing.json")),
            Err(LlmflowError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_to_records_round_trips_rows() {
        let table = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![json!(1), json!("x")]],
        )
        .unwrap();
        assert_eq!(table.to_records(), vec![json!({"a": 1, "b": "x"})]);
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let result = Table::new(vec!["a".into()], vec![vec![json!(1), json!(2)]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_energy_records() {
        let table = Table::from_csv(
            "site, kwh, renewable_kwh, audited\nHQ, 1000, 200.5, true\nDepot, 500, , false\n",
        )
        .unwrap();

        assert_eq!(table.columns(), &["site", "kwh", "renewable_kwh", "audited"]);
        assert_eq!(table.rows()[0], vec![json!("HQ"), json!(1000), json!(200.5), json!(true)]);
        assert_eq!(table.rows()[1][2], Value::Null);
    }

    #[test]
    fn test_csv_rejects_ragged_and_duplicate_headers() {
        assert!(Table::from_csv("a,b\n1,2,3\n").is_err());
        let err = Table::from_csv("kwh,kwh\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate column 'kwh'"));
    }

    #[test]
    fn test_rename_rejects_merged_columns() {
        let mut table =
            Table::from_json_records(r#"[{"KWh": 1, " kwh ": 2, "Site": "A"}]"#).unwrap();

        let err = table.rename_columns(|c| c.trim().to_lowercase()).unwrap_err();
        assert!(matches!(err, LlmflowError::InvalidTable { .. }));
        assert_eq!(table.columns(), &["KWh", " kwh ", "Site"]);

        let mut table = Table::from_json_records(r#"[{"Site": "A"}]"#).unwrap();
        table.rename_columns(|c| c.to_lowercase()).unwrap();
        assert_eq!(table.columns(), &["site"]);
    }
}
