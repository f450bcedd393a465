// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Prompt templates
//!
//! Placeholders are written `{name}` and substituted in a single pass, so
//! substituted values (JSON documents, user text) are never re-scanned.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

/// A fixed prompt with `{name}` placeholders
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    template: &'static str,
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").unwrap_or_else(|_| unreachable!()))
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// Placeholder names in order of first appearance
    pub fn variables(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for caps in placeholder().captures_iter(self.template) {
            if let Some(m) = caps.get(1) {
                if !names.contains(&m.as_str()) {
                    names.push(m.as_str());
                }
            }
        }
        names
    }

    /// Substitute placeholders; unknown placeholders are left untouched
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let lookup: HashMap<&str, &str> = vars.iter().copied().collect();
        placeholder()
            .replace_all(self.template, |caps: &Captures| match lookup.get(&caps[1]) {
                Some(value) => (*value).to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Turns a table schema summary and a request into a chart plan
pub const CHART_PLAN: PromptTemplate = PromptTemplate::new(
    "You plan data visualizations. Using only the columns in the schema below, \
translate the request into a ChartSpec JSON object with the fields chart_type, x, \
y (nullable), aggregate (nullable), color (nullable) and filters (a list of \
{column, op, value} rules). Reply with the JSON object only.\n\n\
Schema:\n{schema}\n\nRequest:\n{request}",
);

/// Asks for a full replacement of a chart plan that references missing columns
pub const CHART_CORRECTION: PromptTemplate = PromptTemplate::new(
    "The ChartSpec below does not match the table schema. Return a corrected \
ChartSpec as a single JSON object and nothing else.\n\n\
Schema:\n{schema}\n\nInvalid spec:\n{spec}\n\nProblems:\n{violations}",
);

/// Two short suggestions to complement the heuristic action plan
pub const ROADMAP_SUGGESTIONS: PromptTemplate = PromptTemplate::new(
    "You advise organisations on decarbonisation. Scope 2 emissions are {scope2} kg CO2 \
and the renewable share of electricity is {share}. Suggest exactly two concise, \
practical actions: one on efficiency and one on renewables. Return them as two \
bullet points, each starting with '- '.",
);

/// Grounded question answering over retrieved chunks
pub const DOCUMENT_QA: PromptTemplate = PromptTemplate::new(
    "Answer the question using only the numbered context passages. Cite the passages \
you rely on as [n]. If the context does not contain the answer, reply \
'Not specified in the document.' Keep the answer concise.\n\n\
Context:\n{context}\n\nQuestion: {question}\n\nAnswer:",
);
