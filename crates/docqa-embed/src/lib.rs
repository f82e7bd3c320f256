//! Embedding providers behind `docqa_core::traits::Embedder`.
//!
//! The same provider configuration must be used to build and to query a
//! collection; vectors from different models are not comparable.

pub mod fake;
pub mod local;
pub mod openai;
pub mod pool;

use docqa_core::config::{expand_path, EmbedProviderKind, Settings};
use docqa_core::error::Result;
use docqa_core::traits::Embedder;
use tracing::info;

pub use fake::FakeEmbedder;
pub use local::LocalEmbedder;
pub use openai::OpenAiEmbedder;
pub use pool::{l2_normalize, masked_mean, masked_mean_l2};

pub const FAKE_DIM: usize = 1024;

/// `APP_USE_FAKE_EMBEDDINGS=1` (or `true`) forces the fake embedder regardless of settings.
pub fn fake_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Builds the embedder selected by `settings.embed.provider`.
pub fn get_default_embedder(settings: &Settings) -> Result<Box<dyn Embedder>> {
    let provider = if fake_forced() { EmbedProviderKind::Fake } else { settings.embed.provider };
    info!(?provider, "selecting embedder");
    let embedder: Box<dyn Embedder> = match provider {
        EmbedProviderKind::Fake => Box::new(FakeEmbedder::new(FAKE_DIM)),
        EmbedProviderKind::OpenAi => {
            let api_key = settings.require_api_key()?;
            Box::new(OpenAiEmbedder::new(&settings.openai, api_key)?)
        }
        EmbedProviderKind::Local => {
            let configured = settings.embed.model_dir.as_deref().map(expand_path);
            let dir = local::resolve_model_dir(configured.as_deref())?;
            Box::new(LocalEmbedder::load(&dir)?)
        }
    };
    Ok(embedder)
}
