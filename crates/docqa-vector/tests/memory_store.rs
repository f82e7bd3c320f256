use std::fs;
use std::sync::{Arc, Mutex};

use docqa_core::chunker::{Chunker, ChunkingConfig};
use docqa_core::config::QuerySettings;
use docqa_core::indexer::Indexer;
use docqa_core::tokenize::HeuristicTokenizer;
use docqa_core::traits::{CompletionModel, VectorStore};
use docqa_core::types::{PromptMessage, Provenance};
use docqa_core::QueryPipeline;
use docqa_embed::FakeEmbedder;
use docqa_vector::InMemoryStore;

#[derive(Clone, Default)]
struct Recorder {
    prompts: Arc<Mutex<Vec<Vec<PromptMessage>>>>,
}

impl CompletionModel for Recorder {
    fn complete(&self, messages: &[PromptMessage]) -> anyhow::Result<String> {
        self.prompts.lock().expect("lock").push(messages.to_vec());
        Ok("Boil it.".into())
    }
}

#[test]
fn indexed_files_answer_questions_with_chunk_sources() {
    let data = tempfile::tempdir().expect("tempdir");
    fs::write(data.path().join("water.txt"), "boil water for one minute before drinking it").expect("write");
    fs::write(data.path().join("garden.txt"), "plant potatoes in spring after frost").expect("write");

    let store = InMemoryStore::new("homestead", Box::new(FakeEmbedder::new(256)));
    let chunker = Chunker::new(ChunkingConfig { max_size: 200, overlap: 20, ..ChunkingConfig::default() }).expect("chunker");
    let report = Indexer::new(chunker).index(data.path(), &store).expect("index");
    assert_eq!(report.chunks_added, 2);
    assert_eq!(store.count().expect("count"), 2);

    let recorder = Recorder::default();
    let pipeline = QueryPipeline::new(
        Box::new(store),
        Box::new(HeuristicTokenizer),
        Box::new(recorder.clone()),
        QuerySettings { k: 1, token_budget: 100 },
    );
    let answer = pipeline.answer_query("boil water for one minute before drinking it").expect("answer");

    assert_eq!(answer.text, "Boil it.");
    assert_eq!(answer.sources.len(), 1);
    match &answer.sources[0] {
        Provenance::Chunk { filename, chunk_id } => {
            assert!(filename.ends_with("water.txt"), "{filename}");
            assert_eq!(*chunk_id, 0);
        }
        other => panic!("expected a chunk source, got {other:?}"),
    }
    let prompts = recorder.prompts.lock().expect("lock");
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0][1].content.contains("boil water for one minute"));
    assert!(!prompts[0][1].content.contains("potatoes"));
}
