//! Chat completion client and token counting.

pub mod openai;
pub mod tokenizer;

pub use openai::ChatClient;
pub use tokenizer::TiktokenCounter;
