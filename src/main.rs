// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! llmflow - fixed-topology LLM pipelines
//!
//! Chart planning, emissions roadmaps and document Q&A from the command line.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llmflow::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "llmflow=debug"
    } else {
        "llmflow=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Pick up OPENAI_API_KEY and friends from a local .env
    dotenvy::dotenv().ok();

    let config = cli.config.as_deref();

    // Dispatch to command handlers
    match cli.command {
        Commands::Chart {
            data,
            request,
            format,
            output,
        } => {
            let settings = cli::load_settings(config)?;
            cli::chart::run(data, request, format, output, settings, cli.verbose).await
        }
        Commands::Roadmap {
            energy,
            report,
            request,
            grid_intensity,
            no_llm,
        } => {
            let settings = cli::load_settings(config)?;
            cli::roadmap::run(
                energy,
                report,
                request,
                grid_intensity,
                no_llm,
                settings,
                cli.verbose,
            )
            .await
        }
        Commands::Ask {
            document,
            question,
            top_k,
        } => {
            let settings = cli::load_settings(config)?;
            cli::ask::run(document, question, top_k, settings, cli.verbose).await
        }
        Commands::Graph { pipeline, format } => {
            cli::graph::run(pipeline, format, cli.verbose).await
        }
        Commands::Config => {
            let settings = cli::load_settings(config)?;
            cli::config::run(settings, cli.verbose).await
        }
    }
}
