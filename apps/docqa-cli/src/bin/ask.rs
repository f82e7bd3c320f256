use std::io;
use std::process::ExitCode;

use clap::Parser;
use docqa_cli::{build_pipeline, describe_error, init_tracing, load_settings, run_loop, AskArgs};
use docqa_core::QueryPipeline;

const BANNER: &str = "
Ask questions about the indexed documents and get answers with their sources.

Some queries to try:
- What is an intelligent agent?
- What are backtracking search algorithms?
- What can you tell me about machine learning?

Type /quit to exit.
";

fn setup(args: &AskArgs) -> docqa_core::Result<QueryPipeline> {
    let mut settings = load_settings()?;
    args.apply(&mut settings);
    build_pipeline(&settings)
}

fn main() -> ExitCode {
    init_tracing();
    let args = AskArgs::parse();
    let pipeline = match setup(&args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", describe_error(&e));
            return ExitCode::FAILURE;
        }
    };

    println!("{BANNER}");
    match run_loop(&pipeline, io::stdin().lock(), io::stdout(), io::stderr()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error reading input: {e}");
            ExitCode::FAILURE
        }
    }
}
