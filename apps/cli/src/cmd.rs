//! Command-line interface definition.

use crate::{prefs::Prefs, repl::ChatRepl};
use anyhow::Result;
use clap::{Parser, Subcommand};
use llm::SampleParams;
use local::CandleEngine;
use runtime::{ChatManager, Llm};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Narwhal — chat with a locally-hosted language model.
#[derive(Debug, Parser)]
#[command(name = "narwhal", version, about)]
pub struct Cli {
    /// Path to a GGUF model file or a directory containing one
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Run on CPU even when an accelerator is available
    #[arg(long, global = true)]
    pub cpu: bool,

    /// Verbosity level (use -v, -vv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to run; defaults to the chat REPL
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chat with the model (default)
    Chat,

    /// Write the default preferences file
    Init,
}

impl Cli {
    /// Initialize the tracing subscriber based on verbosity.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(match self.verbose {
                0 => "warn",
                1 => "narwhal=debug,info",
                _ => "debug",
            })
        });

        tracing_subscriber::fmt()
            .without_time()
            .with_env_filter(filter)
            .with_target(self.verbose != 0)
            .init();
    }

    /// Run the selected command.
    pub async fn run(self) -> Result<()> {
        self.init_tracing();
        match self.command {
            Some(Command::Init) => init_prefs(),
            Some(Command::Chat) | None => self.chat().await,
        }
    }

    /// Load the model and hand control to the REPL.
    async fn chat(self) -> Result<()> {
        let prefs = Prefs::load()?;
        let Some(model) = self.model.or(prefs.model) else {
            anyhow::bail!(
                "no model configured; pass --model or set it in {}",
                Prefs::path().display()
            );
        };

        let llm = Llm::new(CandleEngine::new().cpu(self.cpu));
        let mut manager = ChatManager::new(llm);
        manager.set_params(SampleParams {
            max_tokens: prefs.max_tokens,
            temperature: prefs.temperature,
            top_p: prefs.top_p,
        });
        manager.set_instructions(prefs.instructions);

        println!("loading model from {} ...", model.display());
        manager.load_model(&model).await?;

        ChatRepl::new(manager)?.run().await
    }
}

/// Write the default preferences file if absent.
fn init_prefs() -> Result<()> {
    let path = Prefs::path();
    if path.exists() {
        println!("{} already exists", path.display());
        return Ok(());
    }

    Prefs::default().save()?;
    println!("wrote {}", path.display());
    Ok(())
}
