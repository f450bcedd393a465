// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! # llmflow - fixed-topology LLM pipelines
//!
//! `llmflow` runs small, statically declared pipelines of steps over a typed
//! run state. Steps that call a language model produce structured artifacts
//! validated against a JSON schema; a critic step gets exactly one chance to
//! correct a bad plan before rendering.
//!
//! ## Pipelines
//!
//! - **chart** - summarize a table, plan a chart, critique it, render Vega-Lite
//! - **roadmap** - estimate scope 2 emissions and draft a net-zero action plan
//! - **ask** - chunk a document, retrieve, answer with numbered citations
//!
//! ## Quick Start
//!
//! ```bash
//! # Plan a chart
//! llmflow chart sales.json "Total sales by region as a bar chart"
//!
//! # Roadmap without model suggestions
//! llmflow roadmap energy.json --no-llm
//!
//! # Show the step graph
//! llmflow graph chart --format mermaid
//! ```

pub mod artifact;
pub mod chart;
pub mod cli;
pub mod config;
pub mod errors;
pub mod llm;
pub mod pipeline;
pub mod qa;
pub mod roadmap;
pub mod state;
pub mod table;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use errors::{ErrorKind, LlmflowError, LlmflowResult};
pub use pipeline::{Pipeline, PipelineExecutor, Step, StepContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
