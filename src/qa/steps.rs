// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Document Q&A steps

use async_trait::async_trait;
use tracing::info;

use super::{split_text, Answer, Citation, QaState, Retriever};
use crate::errors::{LlmflowError, LlmflowResult};
use crate::llm::prompts::DOCUMENT_QA;
use crate::llm::CompletionRequest;
use crate::pipeline::{Step, StepContext};
use crate::state::{require, require_text};

/// Characters of each chunk kept in a citation
const SNIPPET_CHARS: usize = 200;

pub struct ChunkStep;

#[async_trait]
impl Step<QaState> for ChunkStep {
    fn name(&self) -> &str {
        "chunk"
    }

    fn description(&self) -> &str {
        "Split the document into overlapping chunks"
    }

    async fn run(&self, state: &mut QaState, ctx: &StepContext) -> LlmflowResult<()> {
        let document = require_text(&state.document, self.name(), "document")?;
        let qa = &ctx.settings.qa;

        let chunks = split_text(document, qa.chunk_size, qa.chunk_overlap);
        info!(chunks = chunks.len(), "Document chunked");
        state
            .messages
            .push(format!("Document split into {} chunks.", chunks.len()));
        state.chunks = Some(chunks);
        Ok(())
    }
}

/// Rank chunks against the question
pub struct RetrieveStep {
    retriever: Box<dyn Retriever>,
}

impl RetrieveStep {
    pub fn new(retriever: impl Retriever + 'static) -> Self {
        Self {
            retriever: Box::new(retriever),
        }
    }
}

#[async_trait]
impl Step<QaState> for RetrieveStep {
    fn name(&self) -> &str {
        "retrieve"
    }

    fn description(&self) -> &str {
        "Select the chunks most relevant to the question"
    }

    async fn run(&self, state: &mut QaState, ctx: &StepContext) -> LlmflowResult<()> {
        let question = require_text(&state.question, self.name(), "question")?;
        let chunks = require(&state.chunks, self.name(), "chunks")?;
        let k = state.top_k.unwrap_or(ctx.settings.qa.top_k);

        let hits = self.retriever.retrieve(question, chunks, k);
        info!(retriever = self.retriever.name(), hits = hits.len(), k, "Chunks retrieved");
        state.messages.push(format!(
            "Retrieved {} of {} chunks ({}).",
            hits.len(),
            chunks.len(),
            self.retriever.name()
        ));
        state.hits = Some(hits);
        Ok(())
    }
}

/// Ask the model, citing the retrieved chunks
pub struct AnswerStep;

#[async_trait]
impl Step<QaState> for AnswerStep {
    fn name(&self) -> &str {
        "answer"
    }

    fn description(&self) -> &str {
        "Answer from the retrieved context with numbered citations"
    }

    async fn run(&self, state: &mut QaState, ctx: &StepContext) -> LlmflowResult<()> {
        let question = require_text(&state.question, self.name(), "question")?;
        let chunks = require(&state.chunks, self.name(), "chunks")?;
        let hits = require(&state.hits, self.name(), "hits")?;
        if hits.is_empty() {
            return Err(LlmflowError::missing(self.name(), "retrieved context"));
        }

        let mut budget = ctx.settings.qa.max_context_chars;
        let mut context = Vec::new();
        let mut citations = Vec::new();

        for hit in hits {
            let Some(chunk) = chunks.iter().find(|c| c.index == hit.chunk_index) else {
                continue;
            };
            if budget == 0 {
                break;
            }
            let number = citations.len() + 1;
            let text: String = chunk.text.chars().take(budget).collect();
            budget = budget.saturating_sub(text.chars().count());

            context.push(format!("[{}] {}", number, text));
            citations.push(Citation {
                number,
                chunk_index: chunk.index,
                snippet: chunk.text.chars().take(SNIPPET_CHARS).collect(),
            });
        }

        let context = context.join("\n\n");
        let prompt = DOCUMENT_QA.render(&[("context", context.as_str()), ("question", question)]);
        let text = ctx
            .llm
            .complete(&CompletionRequest::prompt(prompt).with_temperature(ctx.settings.llm.temperature))
            .await?;

        info!(citations = citations.len(), "Answer generated");
        state.messages.push("Answer generated.");
        state.answer = Some(Answer {
            text: text.trim().to_string(),
            citations,
        });
        Ok(())
    }
}
