// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Runtime configuration
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! environment variables (a `.env` file in the working directory is loaded
//! into the environment by the binary before this runs).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{LlmflowError, LlmflowResult};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "llmflow.toml";

/// Effective settings for one process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Generation service
    pub llm: LlmSettings,
    /// Emissions roadmap pipeline
    pub roadmap: RoadmapSettings,
    /// Document Q&A pipeline
    pub qa: QaSettings,
}

/// Connection and sampling settings for the generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature for planning calls
    pub temperature: f32,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// API key; normally supplied through `OPENAI_API_KEY`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            request_timeout_secs: 60,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadmapSettings {
    /// kg CO₂ emitted per kWh of grid electricity
    pub grid_intensity_kg_per_kwh: f64,
    /// Ask the model for two extra suggestions after the heuristics
    pub llm_suggestions: bool,
    /// Sampling temperature for suggestions
    pub suggestion_temperature: f32,
}

impl Default for RoadmapSettings {
    fn default() -> Self {
        Self {
            grid_intensity_kg_per_kwh: 0.475,
            llm_suggestions: true,
            suggestion_temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaSettings {
    /// Maximum characters per chunk
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
    /// Chunks passed to the model
    pub top_k: usize,
    /// Upper bound on context characters sent with a question
    pub max_context_chars: usize,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            max_context_chars: 4000,
        }
    }
}

impl Settings {
    /// Load settings from an explicit file or the first default location found
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> LlmflowResult<Self> {
        let mut settings = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(LlmflowError::FileNotFound {
                        path: path.to_path_buf(),
                        help: Some("Pass an existing file to --config".into()),
                    });
                }
                Self::from_file(path)?
            }
            None => match Self::default_locations(working_dir)
                .into_iter()
                .find(|p| p.exists())
            {
                Some(path) => Self::from_file(&path)?,
                None => {
                    tracing::debug!("No configuration file found; using defaults");
                    Self::default()
                }
            },
        };

        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Candidate configuration files, most specific first
    pub fn default_locations(working_dir: &Path) -> Vec<PathBuf> {
        let mut locations = vec![working_dir.join(CONFIG_FILE_NAME)];
        if let Some(dirs) = directories::ProjectDirs::from("dev", "llmflow", "llmflow") {
            locations.push(dirs.config_dir().join(CONFIG_FILE_NAME));
        }
        locations
    }

    /// Parse a TOML settings file
    pub fn from_file(path: &Path) -> LlmflowResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LlmflowError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Self::from_toml(&content)
    }

    /// Parse settings from a TOML string
    pub fn from_toml(toml_str: &str) -> LlmflowResult<Self> {
        toml::from_str(toml_str).map_err(Into::into)
    }

    /// Override fields from environment variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = lookup("LLMFLOW_MODEL").filter(|m| !m.is_empty()) {
            self.llm.model = model;
        }
        if let Some(url) = lookup("LLMFLOW_BASE_URL").filter(|u| !u.is_empty()) {
            self.llm.base_url = url.trim_end_matches('/').to_string();
        }
    }

    /// Reject settings no pipeline can run with
    pub fn validate(&self) -> LlmflowResult<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(config_error(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.qa.chunk_size == 0 {
            return Err(config_error("qa.chunk_size must be greater than 0".into()));
        }
        if self.qa.chunk_overlap >= self.qa.chunk_size {
            return Err(config_error(format!(
                "qa.chunk_overlap ({}) must be smaller than qa.chunk_size ({})",
                self.qa.chunk_overlap, self.qa.chunk_size
            )));
        }
        if self.qa.top_k == 0 {
            return Err(config_error("qa.top_k must be at least 1".into()));
        }
        if self.roadmap.grid_intensity_kg_per_kwh < 0.0 {
            return Err(config_error(
                "roadmap.grid_intensity_kg_per_kwh must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Render as TOML with the API key masked
    pub fn to_toml_redacted(&self) -> LlmflowResult<String> {
        let mut shown = self.clone();
        if shown.llm.api_key.is_some() {
            shown.llm.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).map_err(Into::into)
    }
}

fn config_error(message: String) -> LlmflowError {
    LlmflowError::Config {
        message,
        help: Some(format!("Check {}", CONFIG_FILE_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
[llm]
model = "gpt-4o"

[qa]
top_k = 5
"#,
        )
        .unwrap();

        assert_eq!(settings.llm.model, "gpt-4o");
        assert_eq!(settings.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(settings.qa.top_k, 5);
        assert_eq!(settings.qa.chunk_size, 1000);
        assert!((settings.roadmap.grid_intensity_kg_per_kwh - 0.475).abs() < f64::EPSILON);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("LLMFLOW_MODEL", "local-model"),
            ("LLMFLOW_BASE_URL", "http://localhost:1234/v1/"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.llm.model, "local-model");
        assert_eq!(settings.llm.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut settings = Settings::default();
        settings.qa.chunk_overlap = settings.qa.chunk_size;
        assert!(matches!(settings.validate(), Err(LlmflowError::Config { .. })));
    }

    #[test]
    fn test_load_from_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[roadmap]\nllm_suggestions = false\n",
        )
        .unwrap();

        let settings = Settings::load(None, dir.path()).unwrap();
        assert!(!settings.roadmap.llm_suggestions);
    }

    #[test]
    fn test_explicit_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Settings::load(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, LlmflowError::FileNotFound { .. }));
    }

    #[test]
    fn test_redacted_output_hides_key() {
        let mut settings = Settings::default();
        settings.llm.api_key = Some("sk-secret".into());
        let rendered = settings.to_toml_redacted().unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("********"));
    }
}
