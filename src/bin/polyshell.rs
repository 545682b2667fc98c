// src/bin/polyshell.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use polyshell::{
    cli::{Cli, dispatcher},
    system::executor::ShellError,
};

/// The main entry point of the `polyshell` binary.
/// It sets up logging, parses arguments, runs the commands and maps failures
/// to the process exit status.
fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        // A failed command already printed its own output; exit with its status.
        if let Some(shell_err) = e.downcast_ref::<ShellError>()
            && let ShellError::NonZeroExit { code, signal, .. } = shell_err
        {
            log::debug!("{}", shell_err);
            let status = code.or_else(|| signal.map(|s| 128 + s)).unwrap_or(1);
            eprintln!("\n{}: {}", "Error".red().bold(), e);
            std::process::exit(status);
        }

        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatcher::dispatch(cli))
}
