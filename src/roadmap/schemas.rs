// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Emissions roadmap data types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversion factors for the calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactors {
    /// kg CO₂ per kWh of grid electricity
    pub grid_intensity_kg_per_kwh: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            grid_intensity_kg_per_kwh: 0.475,
        }
    }
}

/// Emissions by scope, in kg CO₂
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionBreakdown {
    pub scope1_kgco2: f64,
    pub scope2_kgco2: f64,
    pub scope3_kgco2: f64,
}

impl EmissionBreakdown {
    pub fn total_kgco2(&self) -> f64 {
        self.scope1_kgco2 + self.scope2_kgco2 + self.scope3_kgco2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    Efficiency,
    Renewables,
    Policy,
    Offsets,
    Behavior,
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionCategory::Efficiency => "efficiency",
            ActionCategory::Renewables => "renewables",
            ActionCategory::Policy => "policy",
            ActionCategory::Offsets => "offsets",
            ActionCategory::Behavior => "behavior",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Effort::Low => "low",
            Effort::Medium => "medium",
            Effort::High => "high",
        };
        f.write_str(name)
    }
}

/// One recommended action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlanItem {
    pub action: String,
    pub category: ActionCategory,
    pub est_reduction_kgco2: f64,
    pub effort: Effort,
    pub timeframe_months: u32,
    pub rationale: String,
}

/// Final roadmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapReport {
    pub title: String,
    /// Full report as Markdown
    pub summary_md: String,
    pub breakdown: EmissionBreakdown,
    pub actions: Vec<ActionPlanItem>,
}
