//! CLI preferences stored at `~/.config/narwhal/cli.toml`.
//!
//! Holds the model path, generation parameters, and the system
//! instructions — everything the chat front-end persists between runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted CLI preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    /// Path to a GGUF model file or a directory containing one.
    pub model: Option<PathBuf>,
    /// Maximum number of tokens to sample per reply.
    pub max_tokens: usize,
    /// Softmax temperature.
    pub temperature: f64,
    /// Nucleus sampling probability.
    pub top_p: f64,
    /// System instructions for new sessions.
    pub instructions: String,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.9,
            instructions: "You are a helpful assistant.".to_owned(),
        }
    }
}

impl Prefs {
    /// Load preferences from the default path, returning defaults if missing.
    pub fn load() -> Result<Self> {
        let path = Self::path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Save preferences to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Default path: `~/.config/narwhal/cli.toml`.
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("narwhal")
            .join("cli.toml")
    }
}
