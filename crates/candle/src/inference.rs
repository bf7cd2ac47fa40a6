//! Inference seam over model weights.

use anyhow::Result;
use candle_core::{Device, Tensor, quantized::gguf_file};
use candle_transformers::models::quantized_llama;
use std::fs::File;

/// Forward-pass interface implemented by loadable weight formats.
pub trait Inference: Send + Sized + 'static {
    /// The context window of the model.
    const MAX_SEQ_LEN: usize;

    /// The token string that terminates generation.
    fn eos_token() -> &'static str;

    /// Read weights from a GGUF file.
    fn gguf(device: &Device, file: &mut File) -> Result<Self>;

    /// One forward pass over `input` starting at position `pos`.
    fn forward(&mut self, input: &Tensor, pos: usize) -> Result<Tensor>;
}

impl Inference for quantized_llama::ModelWeights {
    const MAX_SEQ_LEN: usize = quantized_llama::MAX_SEQ_LEN;

    fn eos_token() -> &'static str {
        "<|eot_id|>"
    }

    fn gguf(device: &Device, file: &mut File) -> Result<Self> {
        let content = gguf_file::Content::read(file)?;
        Ok(Self::from_gguf(content, file, device)?)
    }

    fn forward(&mut self, input: &Tensor, pos: usize) -> Result<Tensor> {
        quantized_llama::ModelWeights::forward(self, input, pos)
            .map_err(|e| anyhow::anyhow!("forward pass failed: {e}"))
    }
}
