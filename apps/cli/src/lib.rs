//! Narwhal CLI — terminal chat for locally-hosted models.

pub use cmd::{Cli, Command};

pub mod cmd;
pub mod prefs;
pub mod repl;
