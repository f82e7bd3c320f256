//! BGE-M3 (XLM-RoBERTa) embeddings computed locally with candle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, ensure, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use docqa_core::traits::Embedder;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::pool::masked_mean_l2;

pub const BGE_M3_DIM: usize = 1024;
const MAX_LEN: usize = 256;
const PAD_ID: u32 = 1;
/// Texts per forward pass.
const FORWARD_BATCH: usize = 16;

pub struct LocalEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
}

fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            info!("embedding device: Metal (MPS)");
            return dev;
        }
    }
    info!("embedding device: CPU");
    Device::Cpu
}

impl LocalEmbedder {
    /// Loads `tokenizer.json`, `config.json`, and `pytorch_model.bin` from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading BGE-M3 model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        info!("BGE-M3 model loaded");
        Ok(Self { model, tokenizer, device })
    }

    /// Token ids and attention mask for `texts`, truncated or padded to `[len, MAX_LEN]`.
    fn encode(&self, texts: &[String]) -> Result<(Tensor, Tensor)> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = Vec::with_capacity(texts.len() * MAX_LEN);
        let mut mask = Vec::with_capacity(texts.len() * MAX_LEN);
        for enc in &encodings {
            let kept = enc.get_ids().len().min(MAX_LEN);
            ids.extend_from_slice(&enc.get_ids()[..kept]);
            ids.extend(std::iter::repeat(PAD_ID).take(MAX_LEN - kept));
            mask.extend_from_slice(&enc.get_attention_mask()[..kept]);
            mask.extend(std::iter::repeat(0u32).take(MAX_LEN - kept));
        }
        let shape = (texts.len(), MAX_LEN);
        Ok((Tensor::from_vec(ids, shape, &self.device)?, Tensor::from_vec(mask, shape, &self.device)?))
    }

    fn forward(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = self.encode(texts)?;
        let token_type_ids = Tensor::zeros((texts.len(), MAX_LEN), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let rows: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        ensure!(rows.iter().all(|r| r.len() == BGE_M3_DIM), "expected {} dims from BGE-M3", BGE_M3_DIM);
        Ok(rows)
    }
}

impl Embedder for LocalEmbedder {
    fn dim(&self) -> usize { BGE_M3_DIM }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(FORWARD_BATCH) {
            out.extend(self.forward(batch)?);
        }
        let ms = start.elapsed().as_millis() as u64;
        if !texts.is_empty() && ms / texts.len() as u64 > 100 {
            warn!(ms, texts = texts.len(), "slow embedding");
        } else {
            debug!(ms, texts = texts.len(), "embedded batch");
        }
        Ok(out)
    }
}

/// Finds the model directory: explicit setting, `APP_MODEL_DIR`, `MODEL_DIR`, then `models/bge-m3`.
pub fn resolve_model_dir(configured: Option<&Path>) -> Result<PathBuf> {
    let from_env = ["APP_MODEL_DIR", "MODEL_DIR"].into_iter().filter_map(|var| std::env::var(var).ok()).map(PathBuf::from);
    let candidates = configured.map(Path::to_path_buf).into_iter().chain(from_env).chain([PathBuf::from("models/bge-m3")]);
    for dir in candidates {
        if dir.exists() {
            info!(dir = %dir.display(), "using model dir");
            return Ok(dir);
        }
    }
    Err(anyhow!("Could not locate BGE-M3 model directory"))
}
