//! Tests for command-line parsing.

use clap::Parser;
use narwhal_cli::{Cli, Command};
use std::path::PathBuf;

#[test]
fn defaults_to_the_chat_repl() {
    let cli = Cli::try_parse_from(["narwhal"]).unwrap();
    assert!(cli.command.is_none());
    assert!(cli.model.is_none());
    assert_eq!(cli.verbose, 0);
}

#[test]
fn parses_model_and_verbosity() {
    let cli = Cli::try_parse_from(["narwhal", "--model", "/models/llama3.gguf", "-vv"]).unwrap();
    assert_eq!(cli.model, Some(PathBuf::from("/models/llama3.gguf")));
    assert_eq!(cli.verbose, 2);
}

#[test]
fn parses_init_subcommand() {
    let cli = Cli::try_parse_from(["narwhal", "init", "--cpu"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Init)));
    assert!(cli.cpu);
}
