//! Message accumulator — the UI-facing chat state.
//!
//! [`ChatManager`] owns the ordered message log and the generating flag,
//! translating user input into log mutations by consuming the controller's
//! token stream end-to-end. Observers subscribe to [`ChatSnapshot`] updates
//! republished after every chunk, so they see the reply grow incrementally.

use crate::Llm;
use futures_util::{StreamExt, pin_mut};
use llm::{Engine, Error, Message, SampleParams};
use std::path::Path;
use tokio::sync::watch;

/// Model lifecycle status surfaced to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModelStatus {
    /// No model loaded yet.
    #[default]
    Unloaded,
    /// A load is in progress.
    Loading,
    /// A model is loaded and ready to generate.
    Ready,
    /// The last load failed; generation stays blocked.
    Failed(String),
}

/// A point-in-time view of the chat state.
#[derive(Debug, Clone, Default)]
pub struct ChatSnapshot {
    /// The ordered message log.
    pub messages: Vec<Message>,
    /// Whether a generation is in flight.
    pub generating: bool,
    /// Model lifecycle status.
    pub status: ModelStatus,
}

/// The UI-facing chat state holder.
pub struct ChatManager<E: Engine> {
    llm: Llm<E>,
    messages: Vec<Message>,
    generating: bool,
    status: ModelStatus,
    publisher: watch::Sender<ChatSnapshot>,
}

impl<E: Engine> ChatManager<E> {
    /// Create a manager around the given controller.
    pub fn new(llm: Llm<E>) -> Self {
        let (publisher, _) = watch::channel(ChatSnapshot::default());
        Self {
            llm,
            messages: Vec::new(),
            generating: false,
            status: ModelStatus::Unloaded,
            publisher,
        }
    }

    /// Subscribe to chat state updates.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.publisher.subscribe()
    }

    /// The ordered message log.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether a generation is in flight.
    pub fn generating(&self) -> bool {
        self.generating
    }

    /// Model lifecycle status.
    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    /// A clone of the underlying controller, e.g. for stopping generation
    /// from another task.
    pub fn llm(&self) -> Llm<E> {
        self.llm.clone()
    }

    /// Load a model, tracking status through `Loading` into `Ready` or
    /// `Failed`. A failure blocks generation and persists until the next
    /// successful load.
    pub async fn load_model(&mut self, path: &Path) -> Result<(), Error> {
        self.status = ModelStatus::Loading;
        self.publish();

        let result = self.llm.load(path).await;
        self.status = match &result {
            Ok(()) => ModelStatus::Ready,
            Err(e) => {
                tracing::error!("model load failed: {e}");
                ModelStatus::Failed(e.to_string())
            }
        };
        self.publish();
        result
    }

    /// Send user input and consume the resulting token stream to the end.
    ///
    /// Empty input is a no-op, not an error. Otherwise this appends the
    /// user message and an empty assistant placeholder, then appends each
    /// chunk to the placeholder, republishing after every one. A stream
    /// error replaces the placeholder content with a visible notice. The
    /// generating flag clears exactly once on every termination path —
    /// natural, stopped, or failed.
    pub async fn send(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.messages.push(Message::user(text));
        let pending = self.append(Message::assistant(""));
        self.generating = true;
        self.publish();

        let stream = self.llm.stream(text);
        pin_mut!(stream);
        while let Some(item) = stream.next().await {
            let terminal = item.is_err();
            match item {
                Ok(chunk) => self.messages[pending].content.push_str(&chunk),
                Err(e) => self.messages[pending].content = error_notice(&e),
            }
            self.publish();
            if terminal {
                break;
            }
        }

        self.generating = false;
        self.publish();
    }

    /// Cancel the in-flight generation, if any.
    ///
    /// The log update happens in `send`'s consumption loop when the stream
    /// terminates; this mutates no state itself.
    pub fn stop(&self) {
        self.llm.stop();
    }

    /// Clear the message log.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.publish();
    }

    /// Start a fresh conversation: clears the log and drops the engine
    /// session. The model stays loaded.
    pub fn new_session(&mut self) {
        self.messages.clear();
        self.generating = false;
        self.llm.reset();
        self.publish();
    }

    /// Update the system instructions applied when a new session opens.
    pub fn set_instructions(&self, instructions: impl Into<String>) {
        self.llm.set_instructions(instructions);
    }

    /// Update sampling parameters for subsequent generations.
    pub fn set_params(&self, params: SampleParams) {
        self.llm.set_params(params);
    }

    /// Current sampling parameters.
    pub fn params(&self) -> SampleParams {
        self.llm.params()
    }

    /// Append a message and return its index handle.
    fn append(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    fn publish(&self) {
        self.publisher.send_replace(ChatSnapshot {
            messages: self.messages.clone(),
            generating: self.generating,
            status: self.status.clone(),
        });
    }
}

/// Visible notice shown in place of assistant content when a stream fails.
fn error_notice(err: &Error) -> String {
    format!("❌ Error: {err}")
}
