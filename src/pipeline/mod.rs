// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Pipeline definitions and execution
//!
//! A pipeline is a fixed, statically validated sequence of named steps that
//! share one mutable state. There is no dynamic routing: the order is decided
//! once, when the pipeline is built.

mod dag;
mod definition;
mod executor;
mod validation;

pub use dag::DagBuilder;
pub use definition::*;
pub use executor::{ExecutionOptions, PipelineExecutor, RunReport, StepRecord};
pub use validation::{PipelineValidator, ValidationResult};
