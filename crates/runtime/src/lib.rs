//! Narwhal chat runtime.
//!
//! [`Llm`] mediates access to the loaded model and manages the lifecycle of
//! exactly one token stream at a time; [`ChatManager`] turns user input into
//! message log mutations by consuming that stream end-to-end.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::SampleParams;
//! use runtime::{ChatManager, Llm};
//!
//! let llm = Llm::new(engine);
//! let mut chat = ChatManager::new(llm);
//! chat.load_model(Path::new("model.gguf")).await?;
//! chat.send("hello").await;
//! println!("{}", chat.messages().last().unwrap().content);
//! ```

pub use chat::{ChatManager, ChatSnapshot, ModelStatus};
pub use stream::{Llm, STOP_MARKER};

mod chat;
mod stream;
