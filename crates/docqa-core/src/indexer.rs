//! Directory ingestion: walk, read, chunk, and append to a collection.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::chunker::Chunker;
use crate::error::{Error, Result};
use crate::traits::VectorStore;
use crate::types::{Chunk, ChunkMetadata, Document};

/// Outcome of one indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub files_seen: usize,
    pub files_indexed: usize,
    /// Files skipped because they are not valid UTF-8.
    pub files_skipped: Vec<PathBuf>,
    pub chunks_added: usize,
    pub count_before: usize,
    pub count_after: usize,
}

/// Chunks collected from a directory before they are written anywhere.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub chunks: Vec<Chunk>,
    pub files_seen: usize,
    pub files_indexed: usize,
    pub files_skipped: Vec<PathBuf>,
}

pub struct Indexer {
    chunker: Chunker,
    extensions: Option<Vec<String>>,
}

impl Indexer {
    pub fn new(chunker: Chunker) -> Self {
        Self { chunker, extensions: None }
    }

    /// Restricts ingestion to files with one of `extensions` (without the dot).
    pub fn with_extensions(mut self, extensions: Option<Vec<String>>) -> Self {
        self.extensions = extensions.map(|exts| {
            exts.into_iter().map(|e| e.trim_start_matches('.').to_ascii_lowercase()).collect()
        });
        self
    }

    /// Indexes every readable file under `root` into `store`.
    ///
    /// Record ids continue from the current collection size, so running this
    /// twice over the same directory appends a second copy of every chunk.
    pub fn index(&self, root: &Path, store: &dyn VectorStore) -> Result<IndexReport> {
        let scan = self.scan(root)?;
        let count_before = store.count()?;
        info!(collection = store.name(), count = count_before, "collection contains {count_before} documents");

        let mut report = IndexReport {
            files_seen: scan.files_seen,
            files_indexed: scan.files_indexed,
            files_skipped: scan.files_skipped,
            chunks_added: scan.chunks.len(),
            count_before,
            count_after: count_before,
        };
        if scan.chunks.is_empty() {
            info!(root = %root.display(), "nothing to index");
            return Ok(report);
        }

        let ids: Vec<String> = (count_before..count_before + scan.chunks.len()).map(|i| i.to_string()).collect();
        let mut texts = Vec::with_capacity(scan.chunks.len());
        let mut metadatas = Vec::with_capacity(scan.chunks.len());
        for chunk in scan.chunks {
            metadatas.push(ChunkMetadata::new(chunk.source_id, chunk.chunk_index));
            texts.push(chunk.text);
        }
        info!(collection = store.name(), chunks = texts.len(), "adding {} documents to collection", texts.len());
        store.upsert(&ids, &texts, &metadatas)?;

        report.count_after = store.count()?;
        info!(added = report.count_after.saturating_sub(count_before), "added {} documents", report.count_after.saturating_sub(count_before));
        Ok(report)
    }

    /// Reads and chunks every file under `root` in sorted path order.
    ///
    /// Files that are not valid UTF-8 are logged and skipped; other read errors abort.
    pub fn scan(&self, root: &Path) -> Result<Scan> {
        if !root.is_dir() {
            return Err(Error::NotFound(format!("data directory {}", root.display())));
        }
        let files = self.list_files(root);
        let mut scan = Scan { files_seen: files.len(), ..Scan::default() };
        for (file_index, path) in files.iter().enumerate() {
            match read_document(path) {
                Ok(doc) => {
                    let source_id = doc.path.to_string_lossy().to_string();
                    let chunks = self.chunker.chunk_document(&source_id, &doc.text);
                    info!(file = file_index + 1, of = files.len(), path = %path.display(), chunks = chunks.len(), "processed file");
                    scan.chunks.extend(chunks);
                    scan.files_indexed += 1;
                }
                Err(Error::Decode { path }) => {
                    warn!(path = %path.display(), "skipped file due to unicode decoding error");
                    scan.files_skipped.push(path);
                }
                Err(e) => return Err(e),
            }
        }
        info!(files = scan.files_indexed, chunks = scan.chunks.len(), skipped = scan.files_skipped.len(), "processed directory");
        Ok(scan)
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.accepts(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(extensions) = &self.extensions else { return true };
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Reads a file as UTF-8 text, reporting invalid encodings as `Error::Decode`.
pub fn read_document(path: &Path) -> Result<Document> {
    let bytes = fs::read(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    let text = String::from_utf8(bytes).map_err(|_| Error::Decode { path: path.to_path_buf() })?;
    Ok(Document { path: path.to_path_buf(), text })
}
