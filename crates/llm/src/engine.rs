//! The inference engine boundary.
//!
//! Engines load models, open conversation sessions, and produce token
//! streams. Methods use RPITIT for async without boxing.

use crate::SampleParams;
use anyhow::Result;
use futures_core::Stream;
use std::{future::Future, path::Path};

/// An in-process inference engine.
///
/// The runtime only requires these three capabilities; it is agnostic to
/// how the engine implements them.
pub trait Engine: Send + Sync + 'static {
    /// Opaque loaded model context.
    type Model: Send + Sync + 'static;

    /// Conversational session carrying prior turns. Dropping a session
    /// discards its history; the model stays loaded.
    type Session: Send + 'static;

    /// Load a model from a file or a directory.
    fn load(&self, path: &Path) -> impl Future<Output = Result<Self::Model>> + Send;

    /// Open a fresh conversation session on a loaded model.
    fn session(&self, model: &Self::Model, instructions: &str) -> Self::Session;

    /// Produce the token stream for one prompt within a session.
    ///
    /// The stream is finite and not restartable; chunks arrive in
    /// generation order and the stream may fail mid-flight.
    fn produce(
        &self,
        session: &mut Self::Session,
        prompt: &str,
        params: &SampleParams,
    ) -> impl Stream<Item = Result<String>> + Send;
}
