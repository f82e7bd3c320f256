use std::fs;
use std::sync::{Arc, Mutex};

use anyhow::bail;
use docqa_cli::run_loop;
use docqa_core::chunker::{Chunker, ChunkingConfig};
use docqa_core::config::QuerySettings;
use docqa_core::indexer::Indexer;
use docqa_core::tokenize::HeuristicTokenizer;
use docqa_core::traits::CompletionModel;
use docqa_core::types::PromptMessage;
use docqa_core::QueryPipeline;
use docqa_embed::FakeEmbedder;
use docqa_vector::InMemoryStore;

/// Fails the first call, then answers with the question it was given.
#[derive(Clone, Default)]
struct FlakyCompletion {
    calls: Arc<Mutex<usize>>,
}

impl CompletionModel for FlakyCompletion {
    fn complete(&self, messages: &[PromptMessage]) -> anyhow::Result<String> {
        let mut calls = self.calls.lock().expect("lock");
        *calls += 1;
        if *calls == 1 {
            bail!("HTTP 503: upstream unavailable");
        }
        let question = messages[1].content.split(". Here is").next().unwrap_or_default().to_string();
        Ok(format!("answered: {question}"))
    }
}

fn pipeline(completion: FlakyCompletion) -> QueryPipeline {
    let data = tempfile::tempdir().expect("tempdir");
    fs::write(data.path().join("water.txt"), "boil water for one minute before drinking it").expect("write");
    let store = InMemoryStore::new("homestead", Box::new(FakeEmbedder::new(128)));
    let chunker = Chunker::new(ChunkingConfig::default()).expect("chunker");
    Indexer::new(chunker).index(data.path(), &store).expect("index");
    QueryPipeline::new(
        Box::new(store),
        Box::new(HeuristicTokenizer),
        Box::new(completion),
        QuerySettings { k: 2, token_budget: 100 },
    )
}

fn run(pipeline: &QueryPipeline, input: &str) -> (String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    run_loop(pipeline, input.as_bytes(), &mut out, &mut err).expect("loop");
    (String::from_utf8(out).expect("utf8"), String::from_utf8(err).expect("utf8"))
}

#[test]
fn empty_line_reprompts_and_failures_do_not_end_the_session() {
    let completion = FlakyCompletion::default();
    let pipeline = pipeline(completion.clone());
    let (out, err) = run(&pipeline, "\nq1\nq2\n/quit\nq3\n");

    assert!(out.contains("Please enter a question. Ctrl+C to Quit."), "{out}");
    assert!(err.contains("503"), "{err}");
    assert!(out.contains("answered: The question is q2"), "{out}");
    assert!(!out.contains("q1"), "{out}");
    assert_eq!(out.matches("Thinking...").count(), 2);
    assert_eq!(*completion.calls.lock().expect("lock"), 2);
    assert!(out.contains("Sources: ["), "{out}");
}

#[test]
fn end_of_input_stops_without_quit() {
    let completion = FlakyCompletion::default();
    let pipeline = pipeline(completion.clone());
    let (out, err) = run(&pipeline, "   \n");
    assert!(out.contains("Please enter a question"));
    assert!(err.is_empty());
    assert_eq!(*completion.calls.lock().expect("lock"), 0);
}
