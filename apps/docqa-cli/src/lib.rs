//! Shared setup for the `docqa-index` and `docqa-ask` binaries.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use docqa_core::config::{resolve_with_base, Config, Settings};
use docqa_core::error::{Error, Result};
use docqa_core::tokenize::HeuristicTokenizer;
use docqa_core::traits::Tokenizer;
use docqa_core::QueryPipeline;
use docqa_embed::get_default_embedder;
use docqa_llm::{ChatClient, TiktokenCounter};
use docqa_vector::{open_store, LanceStore};

/// Logs go to stderr so answers on stdout stay clean. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Reads `.env` (if any), then the layered configuration.
pub fn load_settings() -> Result<Settings> {
    let _ = dotenvy::dotenv();
    let config = Config::load().map_err(|e| Error::InvalidConfig(e.to_string()))?;
    config.settings()
}

#[derive(Debug, Parser)]
#[command(name = "docqa-index", about = "Chunk and embed a directory of text files into a collection")]
pub struct IndexArgs {
    /// Directory of text files to index
    #[arg(long, default_value = "data")]
    pub data_directory: String,
    /// Where the collection is stored (overrides store.persist_directory)
    #[arg(long)]
    pub persist_directory: Option<String>,
    /// Collection to add to (overrides store.collection)
    #[arg(long)]
    pub collection_name: Option<String>,
}

impl IndexArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.persist_directory {
            settings.store.persist_directory = dir.clone();
        }
        if let Some(name) = &self.collection_name {
            settings.store.collection = name.clone();
        }
    }

    pub fn data_path(&self) -> PathBuf {
        let cwd = std::env::current_dir().unwrap_or_default();
        resolve_with_base(&cwd, &self.data_directory)
    }
}

#[derive(Debug, Parser)]
#[command(name = "docqa-ask", about = "Ask questions about an indexed collection")]
pub struct AskArgs {
    /// Where the collection is stored (overrides store.persist_directory)
    #[arg(long)]
    pub persist_directory: Option<String>,
    /// Collection to query (overrides store.collection)
    #[arg(long)]
    pub collection_name: Option<String>,
    /// Number of chunks to retrieve (overrides query.k)
    #[arg(short, long)]
    pub k: Option<usize>,
}

impl AskArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.persist_directory {
            settings.store.persist_directory = dir.clone();
        }
        if let Some(name) = &self.collection_name {
            settings.store.collection = name.clone();
        }
        if let Some(k) = self.k {
            settings.query.k = k;
        }
    }
}

pub fn open_collection(settings: &Settings) -> Result<LanceStore> {
    let embedder = get_default_embedder(settings)?;
    open_store(settings, embedder)
}

fn chat_tokenizer(model: &str) -> Box<dyn Tokenizer> {
    match TiktokenCounter::for_model(model) {
        Ok(counter) => Box::new(counter),
        Err(e) => {
            warn!(error = %e, "BPE tables unavailable, estimating tokens from word count");
            Box::new(HeuristicTokenizer)
        }
    }
}

/// Everything `docqa-ask` needs: the stored collection, the chat model and its tokenizer.
pub fn build_pipeline(settings: &Settings) -> Result<QueryPipeline> {
    settings.validate()?;
    let api_key = settings.require_api_key()?;
    let completion = ChatClient::new(&settings.openai, api_key)?;
    let store = open_collection(settings)?;
    Ok(QueryPipeline::new(
        Box::new(store),
        chat_tokenizer(&settings.openai.chat_model),
        Box::new(completion),
        settings.query,
    ))
}

/// One line for the user; configuration problems get a hint instead of a backtrace.
pub fn describe_error(err: &Error) -> String {
    match err {
        Error::InvalidConfig(msg) => format!("Configuration error: {msg}"),
        Error::NotFound(what) => format!("{what} does not exist yet. Run docqa-index first."),
        other => format!("Error: {other}"),
    }
}

/// Reads questions line by line until `/quit` or end of input.
///
/// Answers go to `out`; a failed question is reported on `err` and the loop
/// carries on with the next line.
pub fn run_loop(pipeline: &QueryPipeline, input: impl BufRead, mut out: impl Write, mut err: impl Write) -> io::Result<()> {
    let mut lines = input.lines();
    loop {
        write!(out, "Query: ")?;
        out.flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let query = line.trim();
        if query == "/quit" {
            break;
        }
        if query.is_empty() {
            writeln!(out, "Please enter a question. Ctrl+C to Quit.\n")?;
            continue;
        }
        writeln!(out, "\nThinking...\n")?;
        match pipeline.answer_query(query) {
            Ok(answer) => writeln!(out, "{answer}\n")?,
            Err(e) => writeln!(err, "{}\n", describe_error(&e))?,
        }
    }
    Ok(())
}
