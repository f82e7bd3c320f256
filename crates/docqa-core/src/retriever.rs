use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::VectorStore;
use crate::types::{Candidate, QueryResult};

/// Similarity lookup against one collection.
///
/// Candidates come back in the store's order (closest first); nothing is
/// re-ranked here.
pub struct Retriever<'a> {
    store: &'a dyn VectorStore,
}

impl<'a> Retriever<'a> {
    pub fn new(store: &'a dyn VectorStore) -> Self {
        Self { store }
    }

    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Candidate>> {
        let result = self.store.query(query, k)?;
        let candidates = flatten(result, k)?;
        debug!(collection = self.store.name(), k, hits = candidates.len(), "retrieved candidates");
        Ok(candidates)
    }
}

/// Unpacks the batch-of-one query shape into candidates.
fn flatten(result: QueryResult, k: usize) -> Result<Vec<Candidate>> {
    let QueryResult { ids, documents, metadatas, distances } = result;
    let (Some(ids), Some(documents), Some(metadatas), Some(distances)) = (
        ids.into_iter().next(),
        documents.into_iter().next(),
        metadatas.into_iter().next(),
        distances.into_iter().next(),
    ) else {
        return Ok(Vec::new());
    };
    if ids.len() != documents.len() || documents.len() != metadatas.len() || metadatas.len() != distances.len() {
        return Err(Error::Operation(format!(
            "store returned mismatched result columns: {} ids, {} documents, {} metadatas, {} distances",
            ids.len(),
            documents.len(),
            metadatas.len(),
            distances.len()
        )));
    }
    Ok(ids
        .into_iter()
        .zip(documents)
        .zip(metadatas)
        .zip(distances)
        .take(k)
        .map(|(((id, text), metadata), distance)| Candidate { id, text, metadata, distance })
        .collect())
}
