// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Chunk retrieval

use serde::Serialize;

use super::Chunk;

/// A retrieved chunk and its relevance score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub chunk_index: usize,
    pub score: f64,
}

/// Ranks chunks against a query
pub trait Retriever: Send + Sync {
    /// Up to `k` hits, best first
    fn retrieve(&self, query: &str, chunks: &[Chunk], k: usize) -> Vec<Hit>;

    fn name(&self) -> &str;
}

/// Keyword overlap ranking
///
/// A chunk scores the fraction of query keywords it contains, where keywords
/// are lower-cased words longer than two characters. Ties keep document
/// order. When nothing matches, the leading chunks are returned with score 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRetriever;

/// Distinct lower-cased query words longer than two characters
pub fn keywords(query: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
    {
        if !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

impl Retriever for KeywordRetriever {
    fn retrieve(&self, query: &str, chunks: &[Chunk], k: usize) -> Vec<Hit> {
        let terms = keywords(query);

        let mut hits: Vec<Hit> = if terms.is_empty() {
            Vec::new()
        } else {
            chunks
                .iter()
                .map(|chunk| {
                    let text = chunk.text.to_lowercase();
                    let matched = terms.iter().filter(|t| text.contains(t.as_str())).count();
                    Hit {
                        chunk_index: chunk.index,
                        score: matched as f64 / terms.len() as f64,
                    }
                })
                .filter(|hit| hit.score > 0.0)
                .collect()
        };

        if hits.is_empty() {
            tracing::debug!(query, "No keyword matches; using leading chunks");
            return chunks
                .iter()
                .take(k)
                .map(|chunk| Hit {
                    chunk_index: chunk.index,
                    score: 0.0,
                })
                .collect();
        }

        // stable: equal scores stay in chunk order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        hits
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                index,
                text: text.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_keywords_drop_short_words() {
        assert_eq!(
            keywords("What is the notice period, in days? The notice!"),
            vec!["what", "the", "notice", "period", "days"]
        );
    }

    #[test]
    fn test_ranks_by_fraction_matched() {
        let docs = chunks(&[
            "Payment is due within 30 days.",
            "The notice period is 60 days.",
            "Either party may terminate with notice.",
        ]);

        let hits = KeywordRetriever.retrieve("notice period days", &docs, 2);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_index, 1);
        assert!((hits[0].score - 1.0).abs() < f64::EPSILON);
        // chunks 0 and 2 tie at one third; document order wins
        assert_eq!(hits[1].chunk_index, 0);
    }

    #[test]
    fn test_falls_back_to_leading_chunks() {
        let docs = chunks(&["alpha", "beta", "gamma", "delta"]);
        let hits = KeywordRetriever.retrieve("unrelated question", &docs, 3);

        let indexes: Vec<usize> = hits.iter().map(|h| h.chunk_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }
}
