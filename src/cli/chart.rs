// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Chart command - plan a chart from data and a request

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use super::{executor, print_messages, report, OutputFormat};
use crate::chart::{self, ChartState};
use crate::config::Settings;
use crate::table::Table;
use crate::utils::{print_header, print_section, print_success};

/// Run the chart command
pub async fn run(
    data: PathBuf,
    request: String,
    format: OutputFormat,
    output: Option<PathBuf>,
    settings: Settings,
    verbose: bool,
) -> Result<()> {
    let table = Table::load(&data).map_err(report)?;
    let text = format == OutputFormat::Text;

    if text {
        print_header("Chart");
        println!("  Data: {} ({} rows)", data.display(), table.len());
        println!("  Request: {}", request);
        println!();
    }

    let pipeline = chart::pipeline().map_err(report)?;
    let run = executor(settings, text)?
        .execute(&pipeline, ChartState::new(table, request))
        .await
        .map_err(report)?;

    if verbose {
        tracing::info!(steps = ?run.step_names(), duration_ms = run.duration.as_millis() as u64, "Chart run finished");
    }

    let result = run.state.into_output().map_err(report)?;
    let vega = serde_json::to_string_pretty(&result.vega).into_diagnostic()?;

    if let Some(ref path) = output {
        std::fs::write(path, format!("{}\n", vega)).map_err(|e| {
            miette::miette!("Failed to write '{}': {}", path.display(), e)
        })?;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
        }
        OutputFormat::Text => {
            print_section("Chart spec");
            println!(
                "{}",
                serde_json::to_string_pretty(&result.spec).into_diagnostic()?
            );

            print_messages(&result.messages);

            match output {
                Some(path) => {
                    println!();
                    print_success(&format!("Vega-Lite spec written to {}", path.display()));
                }
                None => {
                    print_section("Vega-Lite");
                    println!("{}", vega);
                }
            }
        }
    }

    Ok(())
}
