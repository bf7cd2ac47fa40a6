//! Model loading from local paths or the HuggingFace hub.

use crate::Inference;
use anyhow::{Context, Result};
use candle_core::Device;
use std::{
    fs::File,
    path::{Path, PathBuf},
};

/// Tokenizer repo used when no `tokenizer.json` ships next to the weights.
const TOKENIZER_REPO: &str = "NousResearch/Meta-Llama-3-8B-Instruct";

/// Resolves model weights and tokenizer files.
pub struct Loader {
    /// The GGUF weights file.
    model: PathBuf,

    /// The tokenizer file.
    tokenizer: PathBuf,
}

impl Loader {
    /// Resolve from a GGUF file path or a directory containing one.
    ///
    /// The tokenizer is expected as `tokenizer.json` next to the weights;
    /// if missing it is fetched from [`TOKENIZER_REPO`].
    pub fn new(path: &Path) -> Result<Self> {
        let model = if path.is_dir() {
            find_gguf(path)?
        } else {
            path.to_owned()
        };

        let tokenizer = model
            .parent()
            .unwrap_or(Path::new("."))
            .join("tokenizer.json");
        let tokenizer = if tokenizer.exists() {
            tokenizer
        } else {
            tracing::info!("no local tokenizer.json, fetching from the hub");
            fetch_tokenizer()?
        };

        Ok(Self { model, tokenizer })
    }

    /// Load the tokenizer.
    pub fn tokenizer(&self) -> Result<tokenizers::Tokenizer> {
        tokenizers::Tokenizer::from_file(&self.tokenizer)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))
    }

    /// Load the model weights.
    pub fn model<I: Inference>(&self, device: &Device) -> Result<I> {
        let mut file = File::open(&self.model)
            .with_context(|| format!("opening {}", self.model.display()))?;
        I::gguf(device, &mut file)
    }
}

/// Find the first `.gguf` file in a directory.
fn find_gguf(dir: &Path) -> Result<PathBuf> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "gguf"))
        .collect();
    paths.sort();
    paths
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no .gguf file in {}", dir.display()))
}

/// Fetch the fallback tokenizer from the hub.
fn fetch_tokenizer() -> Result<PathBuf> {
    let api = hf_hub::api::sync::Api::new()?;
    Ok(api.model(TOKENIZER_REPO.into()).get("tokenizer.json")?)
}
