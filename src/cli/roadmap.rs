// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Roadmap command - emissions estimate and action plan

use miette::Result;
use std::path::PathBuf;

use super::{executor, print_messages, read_text, report};
use crate::config::Settings;
use crate::roadmap::{self, RoadmapState};
use crate::table::Table;

/// Run the roadmap command
pub async fn run(
    energy: PathBuf,
    report_path: Option<PathBuf>,
    request: Option<String>,
    grid_intensity: Option<f64>,
    no_llm: bool,
    mut settings: Settings,
    verbose: bool,
) -> Result<()> {
    if let Some(intensity) = grid_intensity {
        if intensity < 0.0 {
            return Err(miette::miette!(
                "--grid-intensity must not be negative (got {})",
                intensity
            ));
        }
        settings.roadmap.grid_intensity_kg_per_kwh = intensity;
    }
    if no_llm {
        settings.roadmap.llm_suggestions = false;
    }

    let table = Table::load(&energy).map_err(report)?;
    let mut state = RoadmapState::new(table);
    if let Some(path) = report_path {
        state = state.with_report_text(read_text(&path)?);
    }
    if let Some(request) = request {
        state = state.with_request(request);
    }

    let pipeline = roadmap::pipeline().map_err(report)?;
    let run = executor(settings, verbose)?
        .execute(&pipeline, state)
        .await
        .map_err(report)?;

    let messages = run.state.messages.clone();
    let roadmap = run.state.into_report().map_err(report)?;

    println!("{}", roadmap.summary_md);

    if verbose {
        print_messages(&messages);
    } else {
        for message in messages.entries() {
            if message.starts_with("Model suggestions skipped") {
                crate::utils::print_warning(message);
            }
        }
    }

    Ok(())
}
