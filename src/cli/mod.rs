// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for llmflow.

pub mod ask;
pub mod chart;
pub mod config;
pub mod graph;
pub mod roadmap;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::errors::{LlmflowError, RecoverySuggestion};
use crate::llm::OpenAiClient;
use crate::pipeline::{ExecutionOptions, PipelineExecutor, StepContext};

/// Fixed-topology LLM pipelines
#[derive(Parser, Debug)]
#[clap(
    name = "llmflow",
    version,
    about = "Run small, fixed LLM pipelines: chart planning, emissions roadmaps and document Q&A",
    long_about = None,
    after_help = "Examples:\n\
        llmflow chart sales.json \"Bar chart of total sales by region\"\n\
        llmflow roadmap energy.json --report esg.txt --no-llm\n\
        llmflow ask contract.txt \"What is the notice period?\"\n\
        llmflow graph roadmap --format mermaid\n\n\
        See 'llmflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Settings file (defaults to ./llmflow.toml, then the user config dir)
    #[clap(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan and render a chart from tabular data
    Chart {
        /// CSV, or a JSON or YAML array of records
        data: PathBuf,

        /// What to chart, in plain language
        request: String,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write the Vega-Lite spec to this file
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Estimate scope 2 emissions and draft a net-zero roadmap
    Roadmap {
        /// Energy usage records with `kwh` and optional `renewable_kwh`
        energy: PathBuf,

        /// Plain-text sustainability report to draw context from
        #[clap(long)]
        report: Option<PathBuf>,

        /// Focus of the roadmap; also used to search the report
        #[clap(long)]
        request: Option<String>,

        /// Grid intensity in kg CO₂ per kWh
        #[clap(long, value_name = "KG_PER_KWH")]
        grid_intensity: Option<f64>,

        /// Skip the model suggestions and use heuristics only
        #[clap(long)]
        no_llm: bool,
    },

    /// Answer a question about a text document
    Ask {
        /// Plain-text document
        document: PathBuf,

        /// Question to answer
        question: String,

        /// Number of chunks passed to the model
        #[clap(long)]
        top_k: Option<usize>,
    },

    /// Show a pipeline as a graph
    Graph {
        /// Pipeline to show
        #[clap(value_enum)]
        pipeline: PipelineName,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,
    },

    /// Print the effective settings
    Config,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Built-in pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PipelineName {
    Chart,
    Roadmap,
    Ask,
}

/// Load settings for a command
pub fn load_settings(explicit: Option<&Path>) -> miette::Result<Settings> {
    let working_dir = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    Settings::load(explicit, &working_dir).map_err(report)
}

/// Build the executor shared by all steps of one run
pub fn executor(settings: Settings, show_progress: bool) -> miette::Result<PipelineExecutor> {
    let llm = OpenAiClient::new(settings.llm.clone()).map_err(report)?;
    tracing::debug!(model = %settings.llm.model, base_url = %settings.llm.base_url, "LLM client ready");

    Ok(PipelineExecutor::new(StepContext::new(Arc::new(llm), settings))
        .with_options(ExecutionOptions { show_progress }))
}

/// Read a text input file
pub fn read_text(path: &Path) -> miette::Result<String> {
    if !path.exists() {
        return Err(report(LlmflowError::FileNotFound {
            path: path.to_path_buf(),
            help: None,
        }));
    }
    std::fs::read_to_string(path).map_err(|e| {
        report(LlmflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    })
}

/// Print the error class and a recovery hint, then hand the error to miette
pub fn report(error: LlmflowError) -> miette::Report {
    eprintln!("{} {}", "✗".red(), error.kind().to_string().red().bold());
    if let Some(suggestion) = RecoverySuggestion::for_error(&error) {
        eprintln!();
        eprint!("{}", suggestion);
        eprintln!();
    }
    miette::Report::new(error)
}

/// Print the notes a run left in its message log
pub fn print_messages(messages: &crate::state::MessageLog) {
    if messages.is_empty() {
        return;
    }
    crate::utils::print_section("Messages");
    for message in messages.entries() {
        crate::utils::print_bullet(message);
    }
}
