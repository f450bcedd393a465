// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Config command - show the effective settings

use miette::Result;

use super::report;
use crate::config::Settings;

/// Run the config command
pub async fn run(settings: Settings, _verbose: bool) -> Result<()> {
    let rendered = settings.to_toml_redacted().map_err(report)?;
    print!("{}", rendered);
    Ok(())
}
