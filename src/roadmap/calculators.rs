// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Emission calculations and action heuristics

use serde_json::{Number, Value};

use super::{ActionCategory, ActionPlanItem, Effort};
use crate::table::Table;

/// Electricity consumed, in kWh
pub const KWH_COLUMN: &str = "kwh";
/// Electricity from renewable sources, in kWh
pub const RENEWABLE_KWH_COLUMN: &str = "renewable_kwh";

/// Renewable share below which procurement is recommended
const RENEWABLE_SHARE_TARGET: f64 = 0.4;
/// Scope 2 above which audits and retrofits are recommended
const LARGE_SCOPE2_KGCO2: f64 = 10_000.0;

/// Coerce a cell to a number; anything unparseable becomes 0.0
pub fn coerce_number(cell: &Value) -> Value {
    let parsed = match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0.0))
}

fn column_sum(table: &Table, column: &str) -> Option<f64> {
    table
        .column(column)
        .map(|cells| cells.filter_map(Value::as_f64).sum())
}

/// Scope 2 emissions (kg CO₂) and renewable share of electricity
///
/// Returns `(0.0, 0.0)` when there is no `kwh` column.
pub fn electricity_kgco2(table: &Table, grid_intensity_kg_per_kwh: f64) -> (f64, f64) {
    let Some(total_kwh) = column_sum(table, KWH_COLUMN) else {
        return (0.0, 0.0);
    };
    let renewable_kwh = column_sum(table, RENEWABLE_KWH_COLUMN).unwrap_or(0.0);

    let fossil_kwh = (total_kwh - renewable_kwh).max(0.0);
    let scope2 = fossil_kwh * grid_intensity_kg_per_kwh;
    let share = if total_kwh > 0.0 {
        renewable_kwh / total_kwh
    } else {
        0.0
    };
    (scope2, share)
}

/// Rule-based actions for a given scope 2 total and renewable share
pub fn heuristic_actions(scope2: f64, renewable_share: f64) -> Vec<ActionPlanItem> {
    let mut actions = Vec::new();

    if renewable_share < RENEWABLE_SHARE_TARGET {
        actions.push(ActionPlanItem {
            action: "Increase renewable procurement to 50%".into(),
            category: ActionCategory::Renewables,
            est_reduction_kgco2: scope2 * 0.2,
            effort: Effort::Medium,
            timeframe_months: 12,
            rationale: "Raise the renewable share of supply through PPAs or certificates.".into(),
        });
    }

    if scope2 > LARGE_SCOPE2_KGCO2 {
        actions.push(ActionPlanItem {
            action: "Conduct energy audits across facilities".into(),
            category: ActionCategory::Efficiency,
            est_reduction_kgco2: scope2 * 0.1,
            effort: Effort::Low,
            timeframe_months: 6,
            rationale: "Find HVAC, lighting and process savings.".into(),
        });
        actions.push(ActionPlanItem {
            action: "Deploy LED & smart controls".into(),
            category: ActionCategory::Efficiency,
            est_reduction_kgco2: scope2 * 0.05,
            effort: Effort::Medium,
            timeframe_months: 9,
            rationale: "Fast payback measures that cut electricity load.".into(),
        });
    }

    actions.push(ActionPlanItem {
        action: "Employee behavioral program".into(),
        category: ActionCategory::Behavior,
        est_reduction_kgco2: (scope2 * 0.02).max(500.0),
        effort: Effort::Low,
        timeframe_months: 6,
        rationale: "Awareness, shutdown policies and green champions.".into(),
    });

    actions
}

/// Turn `- ` bullet lines from the model into actions
pub fn suggestions_from_bullets(text: &str, scope2: f64) -> Vec<ActionPlanItem> {
    text.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("- "))
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .map(|action| ActionPlanItem {
            action: action.to_string(),
            category: if action.to_lowercase().contains("efficien") {
                ActionCategory::Efficiency
            } else {
                ActionCategory::Renewables
            },
            est_reduction_kgco2: (scope2 * 0.03).max(250.0),
            effort: Effort::Medium,
            timeframe_months: 12,
            rationale: "Suggested by the model.".into(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_electricity_kgco2() {
        let table = Table::from_json_records(
            r#"[{"kwh": 1000, "renewable_kwh": 200}, {"kwh": 500, "renewable_kwh": 100}]"#,
        )
        .unwrap();

        let (scope2, share) = electricity_kgco2(&table, 0.5);
        assert!((scope2 - 600.0).abs() < 1e-9);
        assert!((share - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_missing_kwh_column() {
        let table = Table::from_json_records(r#"[{"site": "A"}]"#).unwrap();
        assert_eq!(electricity_kgco2(&table, 0.5), (0.0, 0.0));
    }

    #[test]
    fn test_renewables_above_total_clamp_to_zero() {
        let table =
            Table::from_json_records(r#"[{"kwh": 100, "renewable_kwh": 150}]"#).unwrap();
        let (scope2, share) = electricity_kgco2(&table, 0.5);
        assert_eq!(scope2, 0.0);
        assert!((share - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(" 12.5 ")), json!(12.5));
        assert_eq!(coerce_number(&json!("n/a")), json!(0.0));
        assert_eq!(coerce_number(&Value::Null), json!(0.0));
        assert_eq!(coerce_number(&json!(7)), json!(7.0));
    }

    #[test]
    fn test_small_footprint_heuristics() {
        let actions = heuristic_actions(600.0, 0.2);
        let names: Vec<&str> = actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(
            names,
            vec!["Increase renewable procurement to 50%", "Employee behavioral program"]
        );
        assert_eq!(actions[1].est_reduction_kgco2, 500.0);
    }

    #[test]
    fn test_large_footprint_heuristics() {
        let actions = heuristic_actions(20_000.0, 0.5);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].category, ActionCategory::Efficiency);
        assert!((actions[0].est_reduction_kgco2 - 2_000.0).abs() < 1e-9);
        assert!((actions[2].est_reduction_kgco2 - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_suggestions_from_bullets() {
        let text = "Here are two ideas:\n- Improve HVAC efficiency with heat pumps\n- Sign a solar PPA\nThanks";
        let actions = suggestions_from_bullets(text, 10_000.0);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].category, ActionCategory::Efficiency);
        assert_eq!(actions[1].category, ActionCategory::Renewables);
        assert!((actions[1].est_reduction_kgco2 - 300.0).abs() < 1e-9);
    }
}
