//! Token stream lifecycle — at most one active generation per controller.
//!
//! [`Llm`] owns the loaded model and an optional conversation session for
//! the underlying engine. Each [`Llm::stream`] call supersedes any stream
//! still running; [`Llm::stop`] cancels the producer and the in-flight
//! stream terminates with a visible stop marker as its final chunk.

use async_stream::stream;
use futures_core::Stream;
use futures_util::{StreamExt, future::Either, pin_mut, stream::once};
use llm::{Engine, Error, SampleParams};
use std::{
    path::Path,
    sync::{
        Arc, Mutex, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::mpsc;

/// Markdown notice appended to a stream cancelled by the user.
pub const STOP_MARKER: &str = "\n\n> ⚠️ Generation stopped by user\n";

/// Mediates access to the engine and the lifecycle of one token stream.
///
/// Cheap to clone — clones share the model, the conversation session, and
/// the active-stream slot, so a clone held by another task can stop a
/// stream started here.
pub struct Llm<E: Engine> {
    inner: Arc<Inner<E>>,
}

struct Inner<E: Engine> {
    /// The inference engine.
    engine: E,
    /// The loaded model, if any.
    model: RwLock<Option<Arc<E::Model>>>,
    /// The conversation session parked between generations.
    session: Mutex<SessionSlot<E::Session>>,
    /// The single active stream handle.
    active: Mutex<Option<Active>>,
    /// System instructions applied when a new session opens.
    instructions: RwLock<String>,
    /// Sampling parameters for the next generation.
    params: RwLock<SampleParams>,
}

/// Session storage with an epoch guard: a producer that checked the session
/// out before a reset must not park a stale session afterwards.
struct SessionSlot<S> {
    session: Option<S>,
    epoch: u64,
}

/// Handle to the in-flight generation.
struct Active {
    cancelled: Arc<AtomicBool>,
    task: tokio::task::JoinHandle<()>,
}

impl Active {
    fn cancel(self) {
        self.cancelled.store(true, Ordering::Release);
        self.task.abort();
    }
}

impl<E: Engine> Llm<E> {
    /// Create an idle controller around the given engine.
    pub fn new(engine: E) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                model: RwLock::new(None),
                session: Mutex::new(SessionSlot {
                    session: None,
                    epoch: 0,
                }),
                active: Mutex::new(None),
                instructions: RwLock::new(String::new()),
                params: RwLock::new(SampleParams::default()),
            }),
        }
    }

    /// Load a model through the engine; any previous model is replaced.
    pub async fn load(&self, path: &Path) -> Result<(), Error> {
        let model = self.inner.engine.load(path).await.map_err(Error::load)?;
        *self.inner.model.write().expect("model lock poisoned") = Some(Arc::new(model));
        Ok(())
    }

    /// Whether a model is loaded.
    pub fn loaded(&self) -> bool {
        self.inner.model.read().expect("model lock poisoned").is_some()
    }

    /// Set the system instructions applied when a new session opens.
    pub fn set_instructions(&self, instructions: impl Into<String>) {
        *self
            .inner
            .instructions
            .write()
            .expect("instructions lock poisoned") = instructions.into();
    }

    /// Set the sampling parameters for subsequent generations.
    pub fn set_params(&self, params: SampleParams) {
        *self.inner.params.write().expect("params lock poisoned") = params;
    }

    /// Current sampling parameters.
    pub fn params(&self) -> SampleParams {
        *self.inner.params.read().expect("params lock poisoned")
    }

    /// Start a token stream for the given prompt.
    ///
    /// Any stream still active is cancelled and discarded first, so at most
    /// one stream produces at a time. Without a loaded model the returned
    /// stream terminates with [`Error::ModelNotLoaded`] instead of the call
    /// failing, so callers consume every stream uniformly. An error chunk
    /// is always terminal.
    pub fn stream(&self, prompt: &str) -> impl Stream<Item = Result<String, Error>> + Send + use<E> {
        if let Some(prev) = self
            .inner
            .active
            .lock()
            .expect("active lock poisoned")
            .take()
        {
            tracing::debug!("superseding active generation");
            prev.cancel();
        }

        let model = self.inner.model.read().expect("model lock poisoned").clone();
        let Some(model) = model else {
            return Either::Left(once(async { Err(Error::ModelNotLoaded) }));
        };

        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::channel::<Result<String, Error>>(1);
        let task = tokio::spawn(produce(
            self.inner.clone(),
            model,
            prompt.to_owned(),
            cancelled.clone(),
            tx,
        ));
        *self.inner.active.lock().expect("active lock poisoned") = Some(Active {
            cancelled: cancelled.clone(),
            task,
        });

        Either::Right(stream! {
            while let Some(item) = rx.recv().await {
                let terminal = item.is_err();
                yield item;
                if terminal {
                    return;
                }
            }
            // The producer is gone; a set flag means it was stopped rather
            // than finished, so surface the notice before closing.
            if cancelled.load(Ordering::Acquire) {
                yield Ok(STOP_MARKER.to_owned());
            }
        })
    }

    /// Cancel the active stream, if any.
    ///
    /// The stream is guaranteed to terminate, with [`STOP_MARKER`] as its
    /// final chunk after any tokens already delivered. Calling this while
    /// idle is a no-op.
    pub fn stop(&self) {
        if let Some(active) = self
            .inner
            .active
            .lock()
            .expect("active lock poisoned")
            .take()
        {
            tracing::debug!("stopping active generation");
            active.cancel();
        }
    }

    /// Drop the conversation session so the next stream starts a fresh
    /// context with no prior turns. The model stays loaded.
    pub fn reset(&self) {
        let mut slot = self.inner.session.lock().expect("session lock poisoned");
        slot.session = None;
        slot.epoch += 1;
    }
}

/// Producer loop: checks out the session, drives the engine stream, and
/// forwards chunks over the single-slot channel until completion, error,
/// or cancellation.
async fn produce<E: Engine>(
    inner: Arc<Inner<E>>,
    model: Arc<E::Model>,
    prompt: String,
    cancelled: Arc<AtomicBool>,
    tx: mpsc::Sender<Result<String, Error>>,
) {
    let (parked, epoch) = {
        let mut slot = inner.session.lock().expect("session lock poisoned");
        (slot.session.take(), slot.epoch)
    };
    let mut session = match parked {
        Some(session) => session,
        None => {
            let instructions = inner
                .instructions
                .read()
                .expect("instructions lock poisoned")
                .clone();
            inner.engine.session(&model, &instructions)
        }
    };
    let params = *inner.params.read().expect("params lock poisoned");

    {
        let stream = inner.engine.produce(&mut session, &prompt, &params);
        pin_mut!(stream);
        while let Some(item) = stream.next().await {
            // Cooperative stop: checked between emissions, so anything the
            // engine yields after cancellation was observed is discarded.
            if cancelled.load(Ordering::Acquire) {
                break;
            }
            let terminal = item.is_err();
            let forwarded = match item {
                Ok(chunk) => tx.send(Ok(chunk)).await,
                Err(e) => {
                    tracing::error!("engine stream failed: {e:#}");
                    tx.send(Err(Error::generation(e))).await
                }
            };
            if terminal || forwarded.is_err() {
                break;
            }
        }
    }

    // Park the session for the next turn, unless a reset happened while
    // this generation was running.
    {
        let mut slot = inner.session.lock().expect("session lock poisoned");
        if slot.epoch == epoch && slot.session.is_none() {
            slot.session = Some(session);
        }
    }

    // Release the handle slot if it is still ours.
    let mut active = inner.active.lock().expect("active lock poisoned");
    if active
        .as_ref()
        .is_some_and(|a| Arc::ptr_eq(&a.cancelled, &cancelled))
    {
        *active = None;
    }
}

impl<E: Engine> Clone for Llm<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Engine> std::fmt::Debug for Llm<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Llm").field("loaded", &self.loaded()).finish()
    }
}
