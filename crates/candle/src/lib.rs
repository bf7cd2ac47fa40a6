//! Local inference engine for narwhal, built on candle.
//!
//! Implements the narwhal [`Engine`](llm::Engine) boundary over GGUF
//! quantized llama weights: loading, chat-template formatting, sampling,
//! and incremental token decoding. Generation runs on a blocking thread
//! and is bridged into the async stream the runtime consumes.

pub use engine::{CandleEngine, CandleModel, CandleSession};
pub use inference::Inference;
pub use loader::Loader;
pub use processor::{Processor, ProcessorConfig};

mod decoder;
mod device;
mod engine;
mod format;
mod inference;
mod loader;
mod processor;
