//! Scripted engine for testing.
//!
//! Implements [`Engine`] with a fixed chunk script instead of a real model.
//! Intended for tests that exercise stream lifecycles — ordering, stop,
//! supersede, mid-stream failure — without loading weights.

use crate::{Engine, SampleParams};
use anyhow::Result;
use futures_core::Stream;
use std::{
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// A scripted engine: every produce call replays the same chunks.
#[derive(Clone, Default)]
pub struct MockEngine {
    chunks: Vec<String>,
    delay: Option<Duration>,
    fail_after: Option<usize>,
    fail_load: Option<String>,
    sessions: Arc<AtomicUsize>,
    instructions: Arc<Mutex<Vec<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockEngine {
    /// Create an engine with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunks yielded by every produce call.
    pub fn chunks<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chunks = chunks.into_iter().map(Into::into).collect();
        self
    }

    /// Sleep before yielding each chunk.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail with a generation error after yielding `n` chunks.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Fail every load call with the given reason.
    pub fn fail_load(mut self, reason: impl Into<String>) -> Self {
        self.fail_load = Some(reason.into());
        self
    }

    /// Number of sessions opened so far.
    pub fn sessions_opened(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    /// Instructions each opened session was created with, in order.
    pub fn instructions_seen(&self) -> Vec<String> {
        self.instructions.lock().expect("mock lock poisoned").clone()
    }

    /// Prompts passed to produce, in order.
    pub fn prompts_seen(&self) -> Vec<String> {
        self.prompts.lock().expect("mock lock poisoned").clone()
    }
}

/// Loaded mock model.
#[derive(Debug)]
pub struct MockModel;

/// Mock conversation session.
pub struct MockSession {
    /// 1-based sequence number of this session.
    pub id: usize,
}

impl Engine for MockEngine {
    type Model = MockModel;
    type Session = MockSession;

    async fn load(&self, _path: &Path) -> Result<MockModel> {
        match &self.fail_load {
            Some(reason) => anyhow::bail!("{reason}"),
            None => Ok(MockModel),
        }
    }

    fn session(&self, _model: &MockModel, instructions: &str) -> MockSession {
        self.instructions
            .lock()
            .expect("mock lock poisoned")
            .push(instructions.to_owned());
        MockSession {
            id: self.sessions.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    fn produce(
        &self,
        _session: &mut MockSession,
        prompt: &str,
        _params: &SampleParams,
    ) -> impl Stream<Item = Result<String>> + Send {
        self.prompts
            .lock()
            .expect("mock lock poisoned")
            .push(prompt.to_owned());

        let chunks = self.chunks.clone();
        let delay = self.delay;
        let fail_after = self.fail_after;
        async_stream::try_stream! {
            let total = chunks.len();
            for (index, chunk) in chunks.into_iter().enumerate() {
                if Some(index) == fail_after {
                    Err(anyhow::anyhow!("scripted failure"))?;
                }
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield chunk;
            }
            if fail_after.is_some_and(|n| n >= total) {
                Err(anyhow::anyhow!("scripted failure"))?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{StreamExt, pin_mut};

    #[tokio::test]
    async fn replays_script_in_order() {
        let engine = MockEngine::new().chunks(["a", "b", "c"]);
        let model = engine.load(Path::new("model")).await.unwrap();
        let mut session = engine.session(&model, "");

        let params = SampleParams::default();
        let stream = engine.produce(&mut session, "hi", &params);
        pin_mut!(stream);
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.push(chunk.unwrap());
        }
        assert_eq!(collected, ["a", "b", "c"]);
        assert_eq!(engine.prompts_seen(), ["hi"]);
    }

    #[tokio::test]
    async fn fails_after_scripted_count() {
        let engine = MockEngine::new().chunks(["a", "b"]).fail_after(1);
        let model = engine.load(Path::new("model")).await.unwrap();
        let mut session = engine.session(&model, "");

        let params = SampleParams::default();
        let stream = engine.produce(&mut session, "hi", &params);
        pin_mut!(stream);
        assert_eq!(stream.next().await.unwrap().unwrap(), "a");
        assert!(stream.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn load_failure_carries_reason() {
        let engine = MockEngine::new().fail_load("no such file");
        let err = engine.load(Path::new("model")).await.unwrap_err();
        assert!(err.to_string().contains("no such file"));
    }

    #[tokio::test]
    async fn sessions_are_counted() {
        let engine = MockEngine::new();
        let model = engine.load(Path::new("model")).await.unwrap();
        assert_eq!(engine.session(&model, "be brief").id, 1);
        assert_eq!(engine.session(&model, "").id, 2);
        assert_eq!(engine.sessions_opened(), 2);
        assert_eq!(engine.instructions_seen(), ["be brief", ""]);
    }
}
