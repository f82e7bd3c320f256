#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use docqa_core::error::{Error, Result};
use docqa_core::traits::{CompletionModel, Tokenizer, VectorStore};
use docqa_core::types::{ChunkMetadata, PromptMessage, QueryResult, RecordId};

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: RecordId,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Collection that keeps records in memory and answers queries in insertion
/// order. It does not exist until the first upsert, unless created with `existing`.
#[derive(Clone, Default)]
pub struct FakeStore {
    pub records: Arc<Mutex<Vec<StoredRecord>>>,
    pub upsert_calls: Arc<Mutex<usize>>,
    pub queries: Arc<Mutex<Vec<(String, usize)>>>,
    exists: Arc<Mutex<bool>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn existing(records: Vec<(&str, ChunkMetadata)>) -> Self {
        let store = Self::default();
        *store.exists.lock().unwrap() = true;
        {
            let mut stored = store.records.lock().unwrap();
            for (i, (text, metadata)) in records.into_iter().enumerate() {
                stored.push(StoredRecord { id: i.to_string(), text: text.to_string(), metadata });
            }
        }
        store
    }

    pub fn snapshot(&self) -> Vec<StoredRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl VectorStore for FakeStore {
    fn name(&self) -> &str {
        "fake"
    }

    fn upsert(&self, ids: &[RecordId], texts: &[String], metadatas: &[ChunkMetadata]) -> Result<()> {
        *self.exists.lock().unwrap() = true;
        *self.upsert_calls.lock().unwrap() += 1;
        let mut records = self.records.lock().unwrap();
        for ((id, text), metadata) in ids.iter().zip(texts).zip(metadatas) {
            records.retain(|r| &r.id != id);
            records.push(StoredRecord { id: id.clone(), text: text.clone(), metadata: metadata.clone() });
        }
        Ok(())
    }

    fn query(&self, text: &str, k: usize) -> Result<QueryResult> {
        if !*self.exists.lock().unwrap() {
            return Err(Error::NotFound("collection fake".into()));
        }
        self.queries.lock().unwrap().push((text.to_string(), k));
        let records = self.records.lock().unwrap();
        let hits: Vec<&StoredRecord> = records.iter().take(k).collect();
        Ok(QueryResult::single(
            hits.iter().map(|r| r.id.clone()).collect(),
            hits.iter().map(|r| r.text.clone()).collect(),
            hits.iter().map(|r| r.metadata.clone()).collect(),
            (0..hits.len()).map(|i| i as f32 * 0.1).collect(),
        ))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.lock().unwrap().len())
    }
}

/// One token per whitespace-separated word.
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn token_count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Returns a fixed reply and remembers every prompt it was sent.
#[derive(Clone)]
pub struct CannedCompletion {
    reply: String,
    pub prompts: Arc<Mutex<Vec<Vec<PromptMessage>>>>,
}

impl CannedCompletion {
    pub fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), prompts: Arc::default() }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl CompletionModel for CannedCompletion {
    fn complete(&self, messages: &[PromptMessage]) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        Ok(self.reply.clone())
    }
}

pub struct FailingCompletion;

impl CompletionModel for FailingCompletion {
    fn complete(&self, _messages: &[PromptMessage]) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("HTTP 503: upstream unavailable"))
    }
}

pub fn words(n: usize, word: &str) -> String {
    vec![word; n].join(" ")
}
