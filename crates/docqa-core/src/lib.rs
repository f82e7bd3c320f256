#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod answer;
pub mod budget;
pub mod chunker;
pub mod config;
pub mod error;
pub mod indexer;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod tokenize;
pub mod traits;
pub mod types;

pub use answer::Answer;
pub use error::{Error, Result};
pub use pipeline::QueryPipeline;
