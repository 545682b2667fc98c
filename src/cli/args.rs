// src/cli/args.rs

use crate::models::{Platform, TokenizeMode};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Tokenizer choices accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerArg {
    /// Split on single spaces, quotes are kept verbatim.
    Naive,
    /// Quote and escape aware splitting.
    Shlex,
}

impl From<TokenizerArg> for TokenizeMode {
    fn from(arg: TokenizerArg) -> Self {
        match arg {
            TokenizerArg::Naive => Self::Naive,
            TokenizerArg::Shlex => Self::Shlex,
        }
    }
}

/// polyshell: run shell commands in sequence, translated for the current platform.
///
/// Each COMMAND runs only after the previous one exited successfully. Multiline
/// commands are joined with line continuations before they run.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// The commands to run, in order (e.g. `polyshell "npm ci" "npm test"`).
    #[arg(required = true, num_args = 1..)]
    pub commands: Vec<String>,

    /// Print each command before running it.
    #[arg(long, short)]
    pub log: bool,

    /// Exit with status 1 as soon as a command fails.
    #[arg(long)]
    pub strict: bool,

    /// Discard the output of every command.
    #[arg(long, short)]
    pub silent: bool,

    /// Path to a TOML config file. Defaults to `<config dir>/polyshell/config.toml`.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Working directory for the commands.
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables for the commands (e.g., "KEY=VALUE").
    #[arg(long, short, value_delimiter = ',')]
    pub env: Vec<String>,

    /// How command lines are split into words.
    #[arg(long, value_enum)]
    pub tokenizer: Option<TokenizerArg>,

    /// Translate for this platform instead of the detected one.
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Spawn programs directly instead of through the platform shell.
    #[arg(long)]
    pub no_shell: bool,

    /// Print the translated commands without running them.
    #[arg(long)]
    pub dry_run: bool,
}
