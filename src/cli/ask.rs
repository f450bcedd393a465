// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Ask command - question answering over one document

use miette::Result;
use std::path::PathBuf;

use super::{executor, print_messages, read_text, report};
use crate::config::Settings;
use crate::qa::{self, QaState};

/// Run the ask command
pub async fn run(
    document: PathBuf,
    question: String,
    top_k: Option<usize>,
    settings: Settings,
    verbose: bool,
) -> Result<()> {
    let text = read_text(&document)?;

    let mut state = QaState::new(text, question);
    if let Some(k) = top_k {
        if k == 0 {
            return Err(miette::miette!("--top-k must be at least 1"));
        }
        state = state.with_top_k(k);
    }

    let pipeline = qa::pipeline().map_err(report)?;
    let run = executor(settings, verbose)?
        .execute(&pipeline, state)
        .await
        .map_err(report)?;

    let messages = run.state.messages.clone();
    let answer = run.state.into_answer().map_err(report)?;

    print!("{}", answer);

    if verbose {
        print_messages(&messages);
    }

    Ok(())
}
