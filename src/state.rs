// src/state.rs

//! The process-wide default shell.
//!
//! Lifecycle: optionally initialized once at startup with [`init_default_shell`],
//! read many times afterwards, never torn down. When nobody initializes it, the
//! first use builds it from `POLYSHELL_LOG`, `POLYSHELL_STRICT` and
//! `POLYSHELL_OPTIONS`.

use crate::{
    core::config_loader,
    models::{KillSignal, ShellConfig},
    system::executor::{Shell, ShellError},
};
use std::sync::OnceLock;

static DEFAULT_SHELL: OnceLock<Shell> = OnceLock::new();

/// Installs the default shell. Fails with the given config if a default shell
/// already exists, either from an earlier call or from first use.
pub fn init_default_shell(config: ShellConfig) -> Result<(), ShellConfig> {
    let mut pending = Some(config);
    DEFAULT_SHELL.get_or_init(|| Shell::new(pending.take().unwrap_or_default()));
    match pending {
        Some(config) => Err(config),
        None => Ok(()),
    }
}

/// The default shell, built from the environment on first use.
pub fn default_shell() -> &'static Shell {
    DEFAULT_SHELL.get_or_init(|| {
        let config = config_loader::config_from_env().unwrap_or_else(|e| {
            log::warn!("Ignoring shell settings from the environment: {}", e);
            ShellConfig::default()
        });
        Shell::new(config)
    })
}

/// Runs `commands` on the default shell.
pub async fn shell<I, S>(commands: I) -> Result<(), ShellError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    default_shell().run(commands).await
}

/// Signals the child currently running on the default shell.
pub fn kill_shell(signal: Option<KillSignal>) -> bool {
    default_shell().kill(signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The default shell is process-wide, so everything touching it lives in one test.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_default_shell_lifecycle() {
        let first = init_default_shell(ShellConfig::default());
        let second = init_default_shell(ShellConfig::default().with_log(true));
        assert!(first.is_ok());
        assert_eq!(second, Err(ShellConfig::default().with_log(true)));

        assert!(!kill_shell(None));
        shell(["true", "echo default shell"]).await.unwrap();
        assert!(shell(["false"]).await.is_err());
        assert!(std::ptr::eq(default_shell(), default_shell()));
    }
}
