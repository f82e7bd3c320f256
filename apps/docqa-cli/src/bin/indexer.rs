use std::process::ExitCode;

use clap::Parser;
use docqa_cli::{describe_error, init_tracing, load_settings, open_collection, IndexArgs};
use docqa_core::chunker::Chunker;
use docqa_core::error::Result;
use docqa_core::indexer::{IndexReport, Indexer};

fn run(args: &IndexArgs) -> Result<IndexReport> {
    let mut settings = load_settings()?;
    args.apply(&mut settings);
    settings.validate()?;

    let data_dir = args.data_path();
    println!("Indexing {}", data_dir.display());
    println!("Collection {} in {}", settings.store.collection, settings.store.persist_path().display());

    let store = open_collection(&settings)?;
    let indexer = Indexer::new(Chunker::new(settings.chunking.clone())?).with_extensions(settings.ingest.extensions.clone());
    indexer.index(&data_dir, &store)
}

fn main() -> ExitCode {
    init_tracing();
    let args = IndexArgs::parse();
    match run(&args) {
        Ok(report) => {
            println!("Collection contains {} documents", report.count_before);
            for path in &report.files_skipped {
                println!("⚠️  Skipped {} (not UTF-8 text)", path.display());
            }
            println!(
                "✅ Added {} documents from {} of {} files",
                report.count_after.saturating_sub(report.count_before),
                report.files_indexed,
                report.files_seen
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", describe_error(&e));
            ExitCode::FAILURE
        }
    }
}
