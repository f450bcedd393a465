// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Graph command - visualize a pipeline as a graph

use miette::Result;

use super::{report, GraphFormat, PipelineName};
use crate::pipeline::{DagBuilder, PipelineSpec};
use crate::{chart, qa, roadmap};

/// Declared shape of a built-in pipeline
pub fn pipeline_spec(name: PipelineName) -> Result<PipelineSpec> {
    let spec = match name {
        PipelineName::Chart => chart::pipeline().map(|p| p.spec().clone()),
        PipelineName::Roadmap => roadmap::pipeline().map(|p| p.spec().clone()),
        PipelineName::Ask => qa::pipeline().map(|p| p.spec().clone()),
    };
    spec.map_err(report)
}

/// Run the graph command
pub async fn run(pipeline: PipelineName, format: GraphFormat, _verbose: bool) -> Result<()> {
    let spec = pipeline_spec(pipeline)?;

    // Build DAG
    let dag = DagBuilder::build(&spec).map_err(report)?;

    // Output in requested format
    let output = match format {
        GraphFormat::Text => dag.to_text(&spec).map_err(report)?,
        GraphFormat::Dot => dag.to_dot(),
        GraphFormat::Mermaid => dag.to_mermaid(),
    };

    println!("{}", output);

    Ok(())
}
