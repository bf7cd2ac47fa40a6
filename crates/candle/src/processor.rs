//! Logits processing and sampling configuration.

use candle_core::Tensor;
use candle_transformers::generation::{LogitsProcessor, Sampling};
use llm::SampleParams;
use rand::Rng;

/// Sampling configuration for one generation request.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorConfig {
    /// Softmax temperature; argmax at or below zero.
    pub temperature: f64,

    /// Nucleus sampling probability.
    pub top_p: f64,

    /// Maximum number of tokens to sample.
    pub sample_len: usize,

    /// Repeat penalty applied over the last `repeat_last_n` tokens.
    pub repeat_penalty: f32,

    /// Window for the repeat penalty.
    pub repeat_last_n: usize,

    /// RNG seed; random when `None`.
    pub seed: Option<u64>,
}

impl From<SampleParams> for ProcessorConfig {
    fn from(params: SampleParams) -> Self {
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            sample_len: params.max_tokens,
            repeat_penalty: 1.1,
            repeat_last_n: 64,
            seed: None,
        }
    }
}

impl ProcessorConfig {
    /// Build the processor.
    pub fn build(self) -> Processor {
        let sampling = if self.temperature <= 0. {
            Sampling::ArgMax
        } else {
            Sampling::TopP {
                p: self.top_p,
                temperature: self.temperature,
            }
        };

        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        Processor {
            processor: LogitsProcessor::from_sampling(seed, sampling),
            sample_len: self.sample_len,
            repeat_penalty: self.repeat_penalty,
            repeat_last_n: self.repeat_last_n,
        }
    }
}

/// Samples the next token from model logits.
pub struct Processor {
    /// The logits processor.
    processor: LogitsProcessor,

    /// Maximum number of tokens to sample.
    pub sample_len: usize,

    /// The repeat penalty.
    repeat_penalty: f32,

    /// The repeat last n.
    repeat_last_n: usize,
}

impl Processor {
    /// Sample the next token, applying the repeat penalty over `context`.
    pub fn sample(&mut self, logits: &Tensor, context: &[u32]) -> anyhow::Result<u32> {
        let logits = if self.repeat_penalty == 1. {
            logits.clone()
        } else {
            let start = context.len().saturating_sub(self.repeat_last_n);
            candle_transformers::utils::apply_repeat_penalty(
                logits,
                self.repeat_penalty,
                &context[start..],
            )?
        };

        self.processor
            .sample(&logits)
            .map_err(|e| anyhow::anyhow!("sampling failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_map_onto_config() {
        let config = ProcessorConfig::from(SampleParams {
            max_tokens: 128,
            temperature: 0.2,
            top_p: 0.95,
        });
        assert_eq!(config.sample_len, 128);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.top_p, 0.95);
    }

    #[test]
    fn zero_temperature_builds() {
        let mut config = ProcessorConfig::from(SampleParams::default());
        config.temperature = 0.;
        config.seed = Some(42);
        let processor = config.build();
        assert_eq!(processor.sample_len, SampleParams::default().max_tokens);
    }
}
