//! Recursive character splitter with overlapping windows.
//!
//! Sizes are counted in `char`s. Text is split on the first separator, pieces
//! that are still too large are split on the next one, and once separators run
//! out the remainder is cut at character boundaries. Separators stay attached to
//! the end of the piece they terminate, so no text is ever dropped: removing the
//! first `min(overlap, prev.len())` chars of every chunk after the first and
//! concatenating gives back the input.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Chunk;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_size: usize,
    pub overlap: usize,
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            overlap: 200,
            separators: vec!["\n\n".into(), "\n".into(), " ".into()],
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::InvalidConfig("chunking.max_size must be at least 1".into()));
        }
        if self.overlap >= self.max_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_size ({})",
                self.overlap, self.max_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        chunk(text, self.config.max_size, self.config.overlap, &self.config.separators)
    }

    /// Chunks one document, numbering the pieces from 0 in generation order.
    pub fn chunk_document(&self, source_id: &str, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk { text, source_id: source_id.to_string(), chunk_index })
            .collect()
    }
}

/// Splits `text` into chunks of at most `max_size` chars, each chunk after the
/// first starting with the last `overlap` chars of its predecessor.
///
/// Out-of-range arguments are clamped (`max_size >= 1`, `overlap < max_size`);
/// use [`ChunkingConfig::validate`] to reject them instead.
pub fn chunk(text: &str, max_size: usize, overlap: usize, separators: &[String]) -> Vec<String> {
    let max_size = max_size.max(1);
    let overlap = overlap.min(max_size - 1);

    // Every piece must fit next to a full overlap prefix.
    let mut pieces = Vec::new();
    split_recursive(text, max_size - overlap, separators, &mut pieces);

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let mut has_new_text = false;
    for piece in pieces {
        let piece_len = char_len(piece);
        if has_new_text && current_len + piece_len > max_size {
            let carried = tail_chars(&current, overlap);
            chunks.push(std::mem::replace(&mut current, carried));
            current_len = char_len(&current);
            has_new_text = false;
        }
        current.push_str(piece);
        current_len += piece_len;
        has_new_text = true;
    }
    if has_new_text {
        chunks.push(current);
    }
    chunks
}

fn split_recursive<'a>(text: &'a str, limit: usize, separators: &[String], out: &mut Vec<&'a str>) {
    if text.is_empty() {
        return;
    }
    if char_len(text) <= limit {
        out.push(text);
        return;
    }
    match separators.split_first() {
        Some((separator, rest)) if !separator.is_empty() => {
            for piece in text.split_inclusive(separator.as_str()) {
                split_recursive(piece, limit, rest, out);
            }
        }
        // An empty separator means "split anywhere", same as running out.
        _ => split_chars(text, limit, out),
    }
}

fn split_chars<'a>(text: &'a str, limit: usize, out: &mut Vec<&'a str>) {
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == limit {
            out.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn tail_chars(s: &str, n: usize) -> String {
    let len = char_len(s);
    s.chars().skip(len.saturating_sub(n)).collect()
}
