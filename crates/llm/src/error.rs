//! Error taxonomy for the chat runtime.
//!
//! Cancellation is deliberately absent: a user stop is a clean termination
//! with a visible marker, never an error value.

/// Errors surfaced by the chat runtime.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Generation was requested before a model was loaded.
    #[error("model not loaded")]
    ModelNotLoaded,

    /// The engine failed to load a model.
    #[error("failed to load model: {0}")]
    Load(String),

    /// The engine failed mid-generation.
    #[error("generation failed: {0}")]
    Generation(String),
}

impl Error {
    /// Wrap an engine load failure.
    pub fn load(err: impl std::fmt::Display) -> Self {
        Self::Load(err.to_string())
    }

    /// Wrap an engine generation failure.
    pub fn generation(err: impl std::fmt::Display) -> Self {
        Self::Generation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        let err = Error::load("file not found");
        assert_eq!(err.to_string(), "failed to load model: file not found");

        let err = Error::generation(anyhow::anyhow!("oom"));
        assert_eq!(err.to_string(), "generation failed: oom");
    }
}
