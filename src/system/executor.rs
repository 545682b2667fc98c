// src/system/executor.rs

use crate::{
    constants::{ECHO_PROGRAM, STRICT_EXIT_CODE},
    core::{command_line, translator::Translator},
    models::{KillSignal, ShellConfig, SpawnArgs, SpawnOptions},
    system::{process, registry::ProcessRegistry},
};
use colored::Colorize;
use std::io::{self, Write};
use std::process::ExitStatus;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Command '{command}' exited with {}", describe_exit(.code, .signal))]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        signal: Option<i32>,
    },
    #[error("Command '{command}' could not be started: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to wait for command '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl ShellError {
    /// The exit code of the failed command, if it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>, signal: &Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("code: {}", code),
        (None, Some(signal)) => format!("signal: {}", signal),
        (None, None) => "an unknown status".to_string(),
    }
}

#[derive(Debug)]
struct ShellInner {
    log: bool,
    strict: bool,
    translator: Translator,
    spawn_options: SpawnOptions,
    registry: ProcessRegistry,
}

/// Runs command strings one after another, translated for the current platform.
///
/// Cloning is cheap and every clone shares the same process registry, so a
/// clone can [`kill`](Self::kill) what another clone is running.
#[derive(Debug, Clone)]
pub struct Shell {
    inner: Arc<ShellInner>,
}

/// Creates a new shell. The translation tables are merged and compiled once here.
pub fn create_shell(config: ShellConfig) -> Shell {
    Shell::new(config)
}

impl Shell {
    pub fn new(config: ShellConfig) -> Self {
        let translator = Translator::from_config(&config);
        let spawn_options = config.effective_spawn_options();
        Self {
            inner: Arc::new(ShellInner {
                log: config.log && !config.silent,
                strict: config.strict,
                translator,
                spawn_options,
                registry: ProcessRegistry::new(),
            }),
        }
    }

    pub fn translator(&self) -> &Translator {
        &self.inner.translator
    }

    /// Normalizes, reflows and translates one raw command string.
    pub fn prepare(&self, raw: &str) -> SpawnArgs {
        self.inner.translator.translate(&command_line::prepare(raw))
    }

    /// Runs every command in order, each one only after the previous exited with 0.
    ///
    /// The first failure stops the sequence and is returned; the remaining commands
    /// never start. In strict mode a failure terminates the host process instead.
    pub async fn run<I, S>(&self, commands: I) -> Result<(), ShellError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for raw in commands {
            let line = command_line::prepare(raw.as_ref());
            let spawn_args = self.inner.translator.translate(&line);
            if self.inner.log
                && let Some(banner) = command_banner(&self.written_program(&line), &spawn_args)
            {
                println!("{}", banner.dimmed());
            }

            if let Err(error) = self.execute(&spawn_args).await {
                return Err(self.fail(error));
            }
        }

        // Separates this batch from whatever is printed next.
        if self.inner.log {
            println!();
        }
        Ok(())
    }

    /// Forwards `signal` (default `SIGTERM`) to the most recently spawned child.
    ///
    /// Returns `false` if nothing is running. The pending `run` still reports
    /// whatever exit status the signalled child ends with.
    /// The program name as the caller wrote it, before any translation.
    fn written_program(&self, line: &str) -> String {
        command_line::tokenize(line, self.inner.translator.tokenizer())
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    pub fn kill(&self, signal: Option<KillSignal>) -> bool {
        self.inner.registry.signal_latest(signal.unwrap_or_default())
    }

    pub fn is_running(&self) -> bool {
        self.inner.registry.is_running()
    }

    pub fn running_pid(&self) -> Option<u32> {
        self.inner.registry.latest_pid()
    }

    async fn execute(&self, spawn_args: &SpawnArgs) -> Result<(), ShellError> {
        let command_line = spawn_args.command_line();
        let mut command = process::build_command(
            spawn_args,
            &self.inner.spawn_options,
            self.inner.translator.tokenizer(),
        );
        log::debug!("Spawning '{}': {:?}", command_line, command);

        let (mut child, forwarders) =
            process::spawn(&mut command, &spawn_args.program).map_err(|source| {
                ShellError::Spawn {
                    command: command_line.clone(),
                    source,
                }
            })?;

        let registry = &self.inner.registry;
        let (id, mut signals) = registry.register(child.id());
        let registration = scopeguard::guard(id, |id| registry.release(id));

        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                Some(signal) = signals.recv() => {
                    if let Err(e) = process::send_signal(&mut child, signal) {
                        log::warn!("Failed to send {} to '{}': {}", signal, command_line, e);
                    }
                }
            }
        };
        drop(registration);

        let status = status.map_err(|source| ShellError::Wait {
            command: command_line.clone(),
            source,
        })?;
        for forwarder in forwarders {
            if let Err(e) = forwarder.await {
                log::warn!("Output forwarder for '{}' failed: {}", command_line, e);
            }
        }

        log::debug!("'{}' exited with {:?}.", command_line, status.code());
        if status.success() {
            Ok(())
        } else {
            Err(ShellError::NonZeroExit {
                command: command_line,
                code: status.code(),
                signal: exit_signal(&status),
            })
        }
    }

    /// Escalates to a host process exit in strict mode, otherwise hands the error back.
    fn fail(&self, error: ShellError) -> ShellError {
        if self.inner.strict {
            log::error!("Strict mode: {}", error);
            eprintln!("\n{}: {}", "Error".red().bold(), error);
            let _ = io::stdout().flush();
            std::process::exit(STRICT_EXIT_CODE);
        }
        error
    }
}

/// The line printed before a command runs, or `None` when the caller wrote
/// `echo`, whose own output would only repeat it. `written_program` is the
/// untranslated program name; the banner shows the translated command.
pub fn command_banner(written_program: &str, spawn_args: &SpawnArgs) -> Option<String> {
    if written_program.trim() == ECHO_PROGRAM {
        return None;
    }
    Some(format!("\n> {}\n", spawn_args))
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
