//! Collection stores behind `docqa_core::traits::VectorStore`.

pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

use docqa_core::config::Settings;
use docqa_core::error::Result;
use docqa_core::traits::Embedder;

pub use lance::LanceStore;
pub use memory::InMemoryStore;

/// Opens the configured persistent collection with `embedder`.
pub fn open_store(settings: &Settings, embedder: Box<dyn Embedder>) -> Result<LanceStore> {
    let store = LanceStore::open(&settings.store.persist_path(), &settings.store.collection, embedder)?;
    Ok(store.with_batch_size(settings.embed.batch_size))
}
