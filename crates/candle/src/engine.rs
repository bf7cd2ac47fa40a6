//! The narwhal [`Engine`] implementation over candle.

use crate::{Inference, Loader, ProcessorConfig, decoder::Decoder, format};
use anyhow::Result;
use async_stream::try_stream;
use candle_core::{Device, Tensor};
use candle_transformers::models::quantized_llama::ModelWeights;
use futures_core::Stream;
use llm::{Engine, Message, SampleParams};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};
use tokio::sync::mpsc;

/// Local inference engine over GGUF quantized llama weights.
#[derive(Clone, Copy, Default)]
pub struct CandleEngine {
    cpu: bool,
}

impl CandleEngine {
    /// Create an engine that auto-detects the device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force CPU execution even when an accelerator is available.
    pub fn cpu(mut self, cpu: bool) -> Self {
        self.cpu = cpu;
        self
    }
}

/// A loaded model: weights, tokenizer, and the device they live on.
pub struct CandleModel {
    weights: Arc<Mutex<ModelWeights>>,
    tokenizer: Arc<tokenizers::Tokenizer>,
    device: Device,
    eos: u32,
}

/// One conversation: accumulated turns over a shared model.
pub struct CandleSession {
    weights: Arc<Mutex<ModelWeights>>,
    tokenizer: Arc<tokenizers::Tokenizer>,
    device: Device,
    eos: u32,
    instructions: String,
    history: Vec<Message>,
}

impl Engine for CandleEngine {
    type Model = CandleModel;
    type Session = CandleSession;

    async fn load(&self, path: &Path) -> Result<CandleModel> {
        let cpu = self.cpu;
        let path = path.to_owned();

        // Weight loading is heavy filesystem and compute work.
        tokio::task::spawn_blocking(move || {
            let device = crate::device::detect(cpu)?;
            let loader = Loader::new(&path)?;
            let tokenizer = loader.tokenizer()?;
            let weights: ModelWeights = loader.model(&device)?;
            let eos = tokenizer
                .get_vocab(true)
                .get(<ModelWeights as Inference>::eos_token())
                .copied()
                .ok_or_else(|| anyhow::anyhow!("eos token not found in vocab"))?;

            tracing::info!("model loaded from {}", path.display());
            Ok(CandleModel {
                weights: Arc::new(Mutex::new(weights)),
                tokenizer: Arc::new(tokenizer),
                device,
                eos,
            })
        })
        .await?
    }

    fn session(&self, model: &CandleModel, instructions: &str) -> CandleSession {
        CandleSession {
            weights: model.weights.clone(),
            tokenizer: model.tokenizer.clone(),
            device: model.device.clone(),
            eos: model.eos,
            instructions: instructions.to_owned(),
            history: Vec::new(),
        }
    }

    fn produce(
        &self,
        session: &mut CandleSession,
        prompt: &str,
        params: &SampleParams,
    ) -> impl Stream<Item = Result<String>> + Send {
        session.history.push(Message::user(prompt));
        let job = GenerationJob {
            weights: session.weights.clone(),
            tokenizer: session.tokenizer.clone(),
            device: session.device.clone(),
            eos: session.eos,
            config: ProcessorConfig::from(*params),
            prompt: format::llama3(&session.instructions, &session.history),
        };

        try_stream! {
            let (tx, mut rx) = mpsc::channel::<Result<String>>(8);
            let worker = tokio::task::spawn_blocking(move || job.run(tx));

            let mut response = String::new();
            while let Some(item) = rx.recv().await {
                let chunk = item?;
                response.push_str(&chunk);
                yield chunk;
            }
            worker.await?;

            // Record the finished turn so the next prompt carries it.
            session.history.push(Message::assistant(response));
        }
    }
}

/// Inputs for one blocking generation run.
struct GenerationJob {
    weights: Arc<Mutex<ModelWeights>>,
    tokenizer: Arc<tokenizers::Tokenizer>,
    device: Device,
    eos: u32,
    config: ProcessorConfig,
    prompt: String,
}

impl GenerationJob {
    /// Run the generation, forwarding chunks until the receiver hangs up,
    /// the token budget runs out, or the model emits eos. Errors are
    /// forwarded as the final item.
    fn run(self, tx: mpsc::Sender<Result<String>>) {
        if let Err(e) = self.sample_loop(&tx) {
            let _ = tx.blocking_send(Err(e));
        }
    }

    fn sample_loop(&self, tx: &mpsc::Sender<Result<String>>) -> Result<()> {
        let mut weights = self.weights.lock().expect("weights lock poisoned");
        let mut processor = self.config.build();
        let mut decoder = Decoder::new(self.tokenizer.clone());

        let mut tokens = self
            .tokenizer
            .encode(self.prompt.as_str(), true)
            .map_err(|e| anyhow::anyhow!("prompt encoding failed: {e}"))?
            .get_ids()
            .to_vec();
        if tokens.len() >= <ModelWeights as Inference>::MAX_SEQ_LEN {
            anyhow::bail!(
                "prompt of {} tokens exceeds the context window",
                tokens.len()
            );
        }

        // Evaluate the prompt in one batch, then sample token by token.
        let mut pos = tokens.len();
        let input = Tensor::new(tokens.as_slice(), &self.device)?.unsqueeze(0)?;
        let logits = Inference::forward(&mut *weights, &input, 0)?.squeeze(0)?;
        let mut next = processor.sample(&logits, &tokens)?;
        tokens.push(next);

        for _ in 0..processor.sample_len {
            if next == self.eos {
                break;
            }
            if let Some(text) = decoder.push(next)? {
                if tx.blocking_send(Ok(text)).is_err() {
                    // Consumer hung up; the generation was cancelled.
                    return Ok(());
                }
            }

            let input = Tensor::new(&[next], &self.device)?.unsqueeze(0)?;
            let logits = Inference::forward(&mut *weights, &input, pos)?.squeeze(0)?;
            next = processor.sample(&logits, &tokens)?;
            tokens.push(next);
            pos += 1;
        }

        if let Some(text) = decoder.flush()? {
            let _ = tx.blocking_send(Ok(text));
        }
        Ok(())
    }
}
