//! Interactive chat REPL with streaming output and persistent history.

use anyhow::Result;
use llm::{Engine, Role};
use runtime::{ChatManager, ChatSnapshot};
use rustyline::error::ReadlineError;
use std::{io::Write, path::PathBuf};
use tokio::sync::watch;

/// Interactive chat REPL over a [`ChatManager`].
pub struct ChatRepl<E: Engine> {
    manager: ChatManager<E>,
    editor: rustyline::DefaultEditor,
    history_path: Option<PathBuf>,
}

impl<E: Engine> ChatRepl<E> {
    /// Create a new REPL with persistent readline history.
    pub fn new(manager: ChatManager<E>) -> Result<Self> {
        let mut editor = rustyline::DefaultEditor::new()?;
        let history_path = history_file_path();
        if let Some(ref path) = history_path {
            let _ = editor.load_history(path);
        }
        Ok(Self {
            manager,
            editor,
            history_path,
        })
    }

    /// Run the interactive loop.
    pub async fn run(mut self) -> Result<()> {
        println!("narwhal chat (Ctrl+C stops generation, Ctrl+D exits)");
        println!("commands: /clear /new /params");
        println!("---");

        loop {
            match self.editor.readline("> ") {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(&line);
                    if self.command(&line) {
                        continue;
                    }
                    self.generate(&line).await;
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        self.save_history();
        Ok(())
    }

    /// Handle a `/` command; returns whether the line was one.
    fn command(&mut self, line: &str) -> bool {
        match line {
            "/clear" => {
                self.manager.clear();
                println!("(cleared)");
            }
            "/new" => {
                self.manager.new_session();
                println!("(new session)");
            }
            "/params" => {
                let params = self.manager.params();
                println!(
                    "max_tokens={} temperature={} top_p={}",
                    params.max_tokens, params.temperature, params.top_p
                );
            }
            _ => return false,
        }
        true
    }

    /// Drive one send to completion, printing the reply as it grows.
    /// Ctrl+C stops generation without leaving the REPL.
    async fn generate(&mut self, line: &str) {
        let llm = self.manager.llm();
        let printer = tokio::spawn(print_stream(self.manager.subscribe()));

        let send = self.manager.send(line);
        tokio::pin!(send);
        loop {
            tokio::select! {
                _ = &mut send => break,
                _ = tokio::signal::ctrl_c() => llm.stop(),
            }
        }

        let _ = printer.await;
        println!();
    }

    /// Save readline history to disk.
    fn save_history(&mut self) {
        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = self.editor.save_history(path);
        }
    }
}

/// Resolve the history file path at `~/.config/narwhal/history`.
fn history_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("narwhal").join("history"))
}

/// Print assistant content increments until generation settles.
async fn print_stream(mut rx: watch::Receiver<ChatSnapshot>) {
    let mut printed = 0usize;
    let mut started = false;

    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        if snapshot.generating {
            started = true;
        }

        if let Some(last) = snapshot.messages.last().filter(|m| m.role == Role::Assistant) {
            if last.content.len() < printed {
                // Content was replaced (error notice); start over.
                println!();
                printed = 0;
            }
            if last.content.len() > printed {
                print!("{}", &last.content[printed..]);
                let _ = std::io::stdout().flush();
                printed = last.content.len();
            }
        }

        if started && !snapshot.generating {
            break;
        }
    }
}
