//! Seams between the pipeline and its external collaborators.
//!
//! Opaque backends (embedding, completion) report failures as `anyhow::Error`;
//! the store uses the typed error because a missing collection is part of its
//! contract.

use crate::error::Result;
use crate::types::{ChunkMetadata, PromptMessage, QueryResult, RecordId};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// A named collection of embedded chunks.
///
/// Implementations embed texts themselves on `upsert` and `query`, with the
/// same embedder for both.
pub trait VectorStore: Send + Sync {
    fn name(&self) -> &str;
    fn upsert(&self, ids: &[RecordId], texts: &[String], metadatas: &[ChunkMetadata]) -> Result<()>;
    /// Nearest neighbours of `text`, closest first, at most `k` of them.
    /// Fails with `Error::NotFound` when the collection does not exist.
    fn query(&self, text: &str, k: usize) -> Result<QueryResult>;
    /// Number of records; an absent collection counts as empty.
    fn count(&self) -> Result<usize>;
}

pub trait Tokenizer: Send + Sync {
    fn token_count(&self, text: &str) -> usize;
}

pub trait CompletionModel: Send + Sync {
    fn complete(&self, messages: &[PromptMessage]) -> anyhow::Result<String>;
}
