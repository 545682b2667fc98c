// src/cli/dispatcher.rs

use anyhow::{Context, Result, anyhow};
use colored::Colorize;

use crate::{
    cli::Cli,
    core::config_loader,
    models::{KillSignal, ShellConfig, ShellMode, StdioMode},
    system::executor::create_shell,
};

/// Resolves the effective configuration: the config file first, then CLI flags on top.
pub fn resolve_config(cli: &Cli) -> Result<ShellConfig> {
    let mut config = match &cli.config {
        Some(path) => config_loader::load_config(path)?,
        None => config_loader::load_default_config()
            .context("Failed to load the default config file")?
            .unwrap_or_default(),
    };

    config.log |= cli.log;
    config.strict |= cli.strict;
    config.silent |= cli.silent;
    if let Some(tokenizer) = cli.tokenizer {
        config.tokenizer = tokenizer.into();
    }
    if let Some(platform) = cli.platform {
        config.platform = Some(platform);
    }
    if let Some(cwd) = &cli.cwd {
        config.spawn.cwd = Some(cwd.clone());
    }
    if cli.no_shell {
        config.spawn.shell = ShellMode::Enabled(false);
    }
    for pair in &cli.env {
        let (key, value) = parse_env_pair(pair)?;
        config.spawn.env.insert(key, value);
    }

    log::debug!("Effective config: {:?}", config);
    Ok(config)
}

fn parse_env_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(anyhow!(
            "Invalid environment variable '{}'. Expected KEY=VALUE.",
            pair
        )),
    }
}

/// Whether Ctrl+C has to be forwarded to the child by hand. A child sharing
/// the terminal is in its foreground process group and already receives it.
fn forwards_interrupts(config: &ShellConfig) -> bool {
    config.effective_spawn_options().stdio != StdioMode::Inherit
}

/// Runs (or previews) the commands given on the command line.
///
/// Ctrl+C never stops polyshell itself while a command runs. A child detached
/// from the terminal gets it forwarded as `SIGINT`; either way the command's
/// own exit status then decides whether the sequence continues.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let forward = forwards_interrupts(&config);
    let shell = create_shell(config);

    if cli.dry_run {
        for command in &cli.commands {
            let spawn_args = shell.prepare(command);
            println!("{} {}", "→".blue(), spawn_args.to_string().green());
        }
        return Ok(());
    }

    let killer = shell.clone();
    let interrupts = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !forward {
                log::debug!("Ctrl+C received; the child shares the terminal and gets it directly.");
            } else if !killer.kill(Some(KillSignal::Interrupt)) {
                log::debug!("Ctrl+C received with no command running.");
            }
        }
    });

    let result = shell.run(&cli.commands).await;
    interrupts.abort();
    result?;
    Ok(())
}
