//! Unified engine interface types for the narwhal chat runtime.
//!
//! This crate provides the shared types used across engine implementations
//! and the runtime: `Message`, `SampleParams`, the `Error` taxonomy, and the
//! `Engine` trait marking the inference boundary. The `testing` feature adds
//! a scripted [`MockEngine`] for exercising stream lifecycles without a
//! real model.

pub use engine::Engine;
pub use error::Error;
pub use message::{Message, Role};
#[cfg(feature = "testing")]
pub use mock::{MockEngine, MockModel, MockSession};
pub use params::SampleParams;

mod engine;
mod error;
mod message;
#[cfg(feature = "testing")]
mod mock;
mod params;
