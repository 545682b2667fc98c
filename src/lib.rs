//! Run sequences of shell commands as child processes, with the command strings
//! translated into the dialect of the platform's shell.
//!
//! ```no_run
//! use polyshell::{ShellConfig, create_shell};
//!
//! # async fn example() -> Result<(), polyshell::ShellError> {
//! let shell = create_shell(ShellConfig::default().with_log(true));
//! shell.run(["cargo fmt --check", "
//!     cargo test
//!       --all-features
//! "]).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod state;
pub mod system;

pub use crate::core::translator::{Translator, translate_for_platform};
pub use models::{
    KillSignal, Platform, PlatformTranslations, ShellConfig, ShellMode, SpawnArgs, SpawnOptions,
    StdioMode, TokenizeMode, TranslationTable,
};
pub use state::{default_shell, init_default_shell, kill_shell, shell};
pub use system::executor::{Shell, ShellError, create_shell};
