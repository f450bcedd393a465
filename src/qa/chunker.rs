// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 llmflow contributors

//! Overlapping text chunks

use serde::Serialize;

/// Preferred break points, strongest first
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// A piece of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in the document, from 0
    pub index: usize,
    pub text: String,
}

/// Split `text` into chunks of at most `chunk_size` characters
///
/// Consecutive chunks share roughly `overlap` characters, aligned to a word
/// start. Chunks end at the strongest separator found in the second half of
/// the window, falling back to a hard cut.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let chars: Vec<char> = text.chars().collect();
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        while start < chars.len() && chars[start].is_whitespace() {
            start += 1;
        }
        if start >= chars.len() {
            break;
        }

        let hard_end = (start + chunk_size).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            find_break(&chars, start, hard_end)
        };

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(Chunk {
                index: chunks.len(),
                text: piece.to_string(),
            });
        }

        if end >= chars.len() {
            break;
        }

        let mut next = end.saturating_sub(overlap);
        while next > start && next < end && !chars[next - 1].is_whitespace() {
            next += 1;
        }
        start = if next > start && next < end { next } else { end };
    }

    chunks
}

/// End index (exclusive) of the chunk starting at `start`
fn find_break(chars: &[char], start: usize, hard_end: usize) -> usize {
    let earliest = start + (hard_end - start) / 2;

    for separator in SEPARATORS {
        let sep: Vec<char> = separator.chars().collect();
        let mut pos = hard_end;
        while pos >= sep.len() && pos - sep.len() > earliest {
            if chars[pos - sep.len()..pos] == sep[..] {
                return pos;
            }
            pos -= 1;
        }
    }

    hard_end
}
