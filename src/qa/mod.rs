// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Document question answering
//!
//! `chunk → retrieve → answer`

mod chunker;
mod retriever;
pub mod steps;

pub use chunker::{split_text, Chunk};
pub use retriever::{keywords, Hit, KeywordRetriever, Retriever};

use serde::Serialize;
use std::fmt;

use crate::errors::{LlmflowError, LlmflowResult};
use crate::pipeline::Pipeline;
use crate::state::{MessageLog, PipelineState};
use steps::{AnswerStep, ChunkStep, RetrieveStep};

/// A numbered reference to a chunk used in the answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    /// Number shown as `[n]` in the answer
    pub number: usize,
    pub chunk_index: usize,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.text)?;
        if !self.citations.is_empty() {
            writeln!(f)?;
            for citation in &self.citations {
                writeln!(
                    f,
                    "[{}] chunk {}: {}",
                    citation.number, citation.chunk_index, citation.snippet
                )?;
            }
        }
        Ok(())
    }
}

/// Run state of the Q&A pipeline
#[derive(Debug, Clone, Default)]
pub struct QaState {
    pub document: Option<String>,
    pub question: Option<String>,
    /// Overrides `qa.top_k` for this run
    pub top_k: Option<usize>,
    pub chunks: Option<Vec<Chunk>>,
    pub hits: Option<Vec<Hit>>,
    pub answer: Option<Answer>,
    pub messages: MessageLog,
}

impl QaState {
    pub fn new(document: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
            question: Some(question.into()),
            ..Default::default()
        }
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    pub fn into_answer(self) -> LlmflowResult<Answer> {
        self.answer
            .ok_or_else(|| LlmflowError::missing("answer", "answer"))
    }
}

impl PipelineState for QaState {
    fn messages(&self) -> &MessageLog {
        &self.messages
    }

    fn messages_mut(&mut self) -> &mut MessageLog {
        &mut self.messages
    }
}

/// The Q&A pipeline with keyword retrieval
pub fn pipeline() -> LlmflowResult<Pipeline<QaState>> {
    pipeline_with(KeywordRetriever)
}

/// The Q&A pipeline with a custom retriever
pub fn pipeline_with(retriever: impl Retriever + 'static) -> LlmflowResult<Pipeline<QaState>> {
    Pipeline::builder("ask")
        .description("Answer a question about a document with citations")
        .then(ChunkStep)
        .then(RetrieveStep::new(retriever))
        .then(AnswerStep)
        .build()
}
