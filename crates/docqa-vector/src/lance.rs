use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use arrow_array::types::Float32Type;
use arrow_array::{Array, ArrayRef, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, VectorStore};
use docqa_core::types::{ChunkMetadata, QueryResult, RecordId};

use crate::schema::{build_arrow_schema, vector_dim, DISTANCE_COLUMN};
use crate::table;

/// A collection persisted as a LanceDB table under a storage directory.
///
/// The store embeds texts itself, so the embedder it is opened with must be the
/// one the collection was built with; a vector-dimension mismatch is rejected.
/// LanceDB is async; calls block on a runtime owned by the store.
pub struct LanceStore {
    rt: Runtime,
    db: Connection,
    collection: String,
    embedder: Box<dyn Embedder>,
    batch_size: usize,
}

impl LanceStore {
    pub fn open(persist_dir: &Path, collection: &str, embedder: Box<dyn Embedder>) -> Result<Self> {
        std::fs::create_dir_all(persist_dir).map_err(|source| Error::Io { path: persist_dir.to_path_buf(), source })?;
        let rt = Runtime::new().map_err(|e| anyhow!("failed to start runtime: {e}"))?;
        let uri = persist_dir.to_string_lossy().to_string();
        let db = rt.block_on(table::open_db(&uri))?;
        info!(path = %uri, collection, "opened collection store");
        Ok(Self { rt, db, collection: collection.to_string(), embedder, batch_size: 256 })
    }

    /// Number of texts sent to the embedder per request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.rt.block_on(table::table_exists(&self.db, &self.collection))?)
    }

    fn dim(&self) -> Result<i32> {
        i32::try_from(self.embedder.dim()).map_err(|_| Error::Operation(format!("embedding dimension {} too large", self.embedder.dim())))
    }

    /// Rejects an embedder whose vectors do not fit the existing table.
    fn check_dim(&self) -> Result<()> {
        if !self.exists()? {
            return Ok(());
        }
        let schema = self.rt.block_on(table::table_schema(&self.db, &self.collection))?;
        let expected = self.dim()?;
        match vector_dim(&schema) {
            Some(found) if found == expected => Ok(()),
            found => Err(Error::InvalidConfig(format!(
                "collection {} holds {}-dimensional vectors but the embedder produces {}; query with the embedder it was built with",
                self.collection,
                found.map_or_else(|| "no".to_string(), |d| d.to_string()),
                expected
            ))),
        }
    }

    fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let pb = ProgressBar::new(texts.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("embedding");
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let embedded = self.embedder.embed_batch(batch)?;
            if embedded.len() != batch.len() {
                return Err(Error::Operation(format!("embedder returned {} vectors for {} texts", embedded.len(), batch.len())));
            }
            vectors.extend(embedded);
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("embedded");
        Ok(vectors)
    }

    fn to_record_batch(&self, ids: &[RecordId], texts: &[String], metadatas: &[ChunkMetadata], vectors: &[Vec<f32>]) -> Result<RecordBatch> {
        let dim = self.dim()?;
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.embedder.dim()) {
            return Err(Error::Operation(format!("embedding has {} dims, expected {}", bad.len(), dim)));
        }
        let as_i64 = |n: usize| i64::try_from(n).map_err(|_| Error::Operation(format!("value {n} out of range")));
        let chunk_ids = metadatas.iter().map(|m| as_i64(m.chunk_id)).collect::<Result<Vec<_>>>()?;
        let pages: Vec<Option<i64>> = metadatas.iter().map(|m| m.page_number.map(i64::from)).collect();
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(ids)),
            Arc::new(StringArray::from_iter_values(metadatas.iter().map(|m| m.filename.as_str()))),
            Arc::new(Int64Array::from(chunk_ids)),
            Arc::new(Int64Array::from(pages)),
            Arc::new(StringArray::from_iter_values(texts)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
                vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>())),
                dim,
            )),
        ];
        let batch = RecordBatch::try_new(build_arrow_schema(dim), columns)
            .map_err(|e| anyhow!("failed to build record batch: {e}"))?;
        Ok(batch)
    }
}

impl VectorStore for LanceStore {
    fn name(&self) -> &str {
        &self.collection
    }

    fn upsert(&self, ids: &[RecordId], texts: &[String], metadatas: &[ChunkMetadata]) -> Result<()> {
        if ids.len() != texts.len() || texts.len() != metadatas.len() {
            return Err(Error::Operation(format!(
                "upsert needs one text and one metadata per id ({} ids, {} texts, {} metadatas)",
                ids.len(),
                texts.len(),
                metadatas.len()
            )));
        }
        if ids.is_empty() {
            return Ok(());
        }
        self.check_dim()?;
        let vectors = self.embed_all(texts)?;
        let batch = self.to_record_batch(ids, texts, metadatas, &vectors)?;
        self.rt.block_on(table::upsert_batch(&self.db, &self.collection, batch))?;
        info!(collection = %self.collection, rows = ids.len(), "upserted records");
        Ok(())
    }

    fn query(&self, text: &str, k: usize) -> Result<QueryResult> {
        if !self.exists()? {
            return Err(Error::NotFound(format!("collection {}", self.collection)));
        }
        if k == 0 {
            return Ok(QueryResult::single(Vec::new(), Vec::new(), Vec::new(), Vec::new()));
        }
        self.check_dim()?;
        let vector = self.embedder.embed(text)?;
        let batches = self.rt.block_on(table::nearest(&self.db, &self.collection, vector, k))?;

        let (mut ids, mut documents, mut metadatas, mut distances) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for batch in &batches {
            let id_col = string_column(batch, "id")?;
            let filename_col = string_column(batch, "filename")?;
            let content_col = string_column(batch, "content")?;
            let chunk_col = int64_column(batch, "chunk_id")?;
            let page_col = int64_column(batch, "page_number")?;
            let distance_col = batch
                .column_by_name(DISTANCE_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| anyhow!("{DISTANCE_COLUMN} column missing"))?;
            for i in 0..batch.num_rows() {
                let page_number = if page_col.is_null(i) { None } else { u32::try_from(page_col.value(i)).ok() };
                ids.push(id_col.value(i).to_string());
                documents.push(content_col.value(i).to_string());
                metadatas.push(ChunkMetadata {
                    filename: filename_col.value(i).to_string(),
                    chunk_id: usize::try_from(chunk_col.value(i)).unwrap_or_default(),
                    page_number,
                });
                distances.push(distance_col.value(i));
            }
        }
        debug!(collection = %self.collection, k, hits = ids.len(), "vector search");
        Ok(QueryResult::single(ids, documents, metadatas, distances))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.rt.block_on(table::count_rows(&self.db, &self.collection))?)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    Ok(batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("{name} column missing"))?)
}

fn int64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
    Ok(batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| anyhow!("{name} column missing"))?)
}
