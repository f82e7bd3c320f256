use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::anyhow;
use tracing::debug;

use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, VectorStore};
use docqa_core::types::{ChunkMetadata, QueryResult, RecordId};

struct Record {
    id: RecordId,
    text: String,
    metadata: ChunkMetadata,
    vector: Vec<f32>,
}

/// Records in insertion order plus the position of each id.
#[derive(Default)]
struct Collection {
    records: Vec<Record>,
    positions: HashMap<RecordId, usize>,
}

impl Collection {
    fn put(&mut self, record: Record) {
        match self.positions.get(&record.id) {
            Some(&at) => self.records[at] = record,
            None => {
                self.positions.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }
}

/// A collection kept in process memory. Nothing survives the process.
///
/// Like the persistent store it does not exist until the first upsert, and
/// ties in distance keep insertion order.
pub struct InMemoryStore {
    name: String,
    embedder: Box<dyn Embedder>,
    collection: RwLock<Option<Collection>>,
}

impl InMemoryStore {
    pub fn new(name: &str, embedder: Box<dyn Embedder>) -> Self {
        Self { name: name.to_string(), embedder, collection: RwLock::new(None) }
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
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
        let vectors = self.embedder.embed_batch(texts)?;
        if vectors.len() != texts.len() {
            return Err(Error::Operation(format!("embedder returned {} vectors for {} texts", vectors.len(), texts.len())));
        }
        let mut guard = self.collection.write().map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let collection = guard.get_or_insert_with(Collection::default);
        for (((id, text), metadata), vector) in ids.iter().zip(texts).zip(metadatas).zip(vectors) {
            collection.put(Record { id: id.clone(), text: text.clone(), metadata: metadata.clone(), vector });
        }
        debug!(collection = %self.name, rows = ids.len(), total = collection.records.len(), "upserted records");
        Ok(())
    }

    fn query(&self, text: &str, k: usize) -> Result<QueryResult> {
        let guard = self.collection.read().map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let Some(collection) = guard.as_ref() else {
            return Err(Error::NotFound(format!("collection {}", self.name)));
        };
        let query = self.embedder.embed(text)?;
        let mut scored: Vec<(f32, &Record)> = collection.records.iter().map(|r| (squared_l2(&query, &r.vector), r)).collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(k);

        let mut result = QueryResult::single(Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for (distance, record) in scored {
            result.ids[0].push(record.id.clone());
            result.documents[0].push(record.text.clone());
            result.metadatas[0].push(record.metadata.clone());
            result.distances[0].push(distance);
        }
        Ok(result)
    }

    fn count(&self) -> Result<usize> {
        let guard = self.collection.read().map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        Ok(guard.as_ref().map_or(0, |c| c.records.len()))
    }
}
