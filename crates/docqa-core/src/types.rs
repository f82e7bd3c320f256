//! Domain types shared by the indexing and query paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub type RecordId = String;

/// A source file as read by the indexer. Dropped once it has been chunked.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
}

/// A contiguous piece of a document's text.
///
/// - `source_id`: identifier of the owning document (its path)
/// - `chunk_index`: position in the document's chunk sequence, contiguous from 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub chunk_index: usize,
}

/// Metadata stored next to every record in a collection.
///
/// `filename` and `chunk_id` are written by the indexer. `page_number` is only
/// present for corpora that were converted from paged books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    pub chunk_id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

impl ChunkMetadata {
    pub fn new(filename: impl Into<String>, chunk_id: usize) -> Self {
        Self { filename: filename.into(), chunk_id, page_number: None }
    }

    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    /// The citation shown to the user for a chunk with this metadata.
    pub fn provenance(&self) -> Provenance {
        match self.page_number {
            Some(page) => Provenance::Page(page),
            None => Provenance::Chunk { filename: self.filename.clone(), chunk_id: self.chunk_id },
        }
    }
}

/// Raw answer of a similarity query.
///
/// Mirrors the batch-of-one shape of the store contract: every outer vector has
/// exactly one element holding the actual results, ordered by increasing distance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub ids: Vec<Vec<RecordId>>,
    pub documents: Vec<Vec<String>>,
    pub metadatas: Vec<Vec<ChunkMetadata>>,
    pub distances: Vec<Vec<f32>>,
}

impl QueryResult {
    /// Wraps a single result list into the batch-of-one shape.
    pub fn single(
        ids: Vec<RecordId>,
        documents: Vec<String>,
        metadatas: Vec<ChunkMetadata>,
        distances: Vec<f32>,
    ) -> Self {
        Self { ids: vec![ids], documents: vec![documents], metadatas: vec![metadatas], distances: vec![distances] }
    }
}

/// One retrieved chunk, in the order the store ranked it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: RecordId,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

/// Where a piece of context came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    Page(u32),
    Chunk { filename: String, chunk_id: usize },
}

impl Provenance {
    pub fn is_page(&self) -> bool {
        matches!(self, Provenance::Page(_))
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Page(page) => write!(f, "{page}"),
            Provenance::Chunk { filename, chunk_id } => write!(f, "{filename}#{chunk_id}"),
        }
    }
}

/// The context that fits the token budget, with one provenance marker per text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetedContext {
    pub texts: Vec<String>,
    pub provenance: Vec<Provenance>,
    pub tokens_used: usize,
}

impl BudgetedContext {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A chat message in the shape completion APIs expect (`{"role", "content"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}
