// src/system/process.rs

//! The spawn boundary: turns translated arguments and spawn options into a
//! running `tokio::process::Child`, and delivers signals to it.

use crate::{
    constants::{POSIX_SHELL, WINDOWS_SHELL},
    models::{KillSignal, ShellMode, SpawnArgs, SpawnOptions, StdioMode, TokenizeMode},
};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Builds the command for `spawn_args`. Nothing is started yet.
///
/// In shell mode the program and arguments are joined back into one command
/// line and handed to the shell, so operators like `&&` keep working.
pub fn build_command(
    spawn_args: &SpawnArgs,
    options: &SpawnOptions,
    tokenizer: TokenizeMode,
) -> Command {
    let mut command = match &options.shell {
        ShellMode::Enabled(false) => {
            let mut c = Command::new(&spawn_args.program);
            c.args(&spawn_args.args);
            c
        }
        ShellMode::Enabled(true) => shell_command(default_shell(), &shell_line(spawn_args, tokenizer)),
        ShellMode::Program(shell) => shell_command(shell, &shell_line(spawn_args, tokenizer)),
    };

    match options.stdio {
        StdioMode::Inherit => {
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        }
        StdioMode::Null => {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }
        StdioMode::Piped => {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }
    }

    if let Some(cwd) = &options.cwd {
        command.current_dir(resolve_cwd(cwd));
    }
    if options.clear_env {
        command.env_clear();
    }
    command.envs(&options.env);
    command.kill_on_drop(true);
    command
}

fn default_shell() -> &'static str {
    if cfg!(windows) { WINDOWS_SHELL } else { POSIX_SHELL }
}

fn is_cmd_exe(shell: &str) -> bool {
    let name = shell.rsplit(['/', '\\']).next().unwrap_or(shell).to_lowercase();
    name == "cmd" || name == "cmd.exe"
}

fn shell_command(shell: &str, line: &str) -> Command {
    let mut command = Command::new(shell);
    if is_cmd_exe(shell) {
        command.args(["/d", "/s", "/c"]);
        push_cmd_line(&mut command, line);
    } else {
        command.arg("-c").arg(line);
    }
    command
}

#[cfg(windows)]
fn push_cmd_line(command: &mut Command, line: &str) {
    // cmd.exe strips the outer quotes itself with /s.
    command.raw_arg(format!("\"{}\"", line));
}

#[cfg(not(windows))]
fn push_cmd_line(command: &mut Command, line: &str) {
    command.arg(line);
}

/// The command line handed to a shell. Quote-aware tokens are re-quoted so
/// the shell sees the same words the tokenizer produced.
pub fn shell_line(spawn_args: &SpawnArgs, tokenizer: TokenizeMode) -> String {
    match tokenizer {
        TokenizeMode::Naive => spawn_args.command_line(),
        TokenizeMode::Shlex => {
            let words = std::iter::once(spawn_args.program.as_str())
                .chain(spawn_args.args.iter().map(String::as_str));
            shlex::try_join(words).unwrap_or_else(|e| {
                log::debug!("Could not quote '{}': {}", spawn_args, e);
                spawn_args.command_line()
            })
        }
    }
}

/// Expands `~` and strips Windows verbatim prefixes from the working directory.
pub fn resolve_cwd(cwd: &std::path::Path) -> PathBuf {
    let raw = cwd.to_string_lossy();
    let expanded = shellexpand::tilde(&raw);
    dunce::simplified(std::path::Path::new(expanded.as_ref())).to_path_buf()
}

/// Spawns `command`, forwarding piped output to the log under `label`.
/// The returned handles finish once both streams reach end of file.
pub fn spawn(command: &mut Command, label: &str) -> io::Result<(Child, Vec<JoinHandle<()>>)> {
    let mut child = command.spawn()?;
    let mut forwarders = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        forwarders.push(forward_lines(stdout, label.to_string(), false));
    }
    if let Some(stderr) = child.stderr.take() {
        forwarders.push(forward_lines(stderr, label.to_string(), true));
    }
    Ok((child, forwarders))
}

/// Logs every line of `stream` until end of file. Lines that are not valid
/// UTF-8 are logged lossily; the pipe is always drained so the child never
/// blocks on a full or closed pipe.
fn forward_lines<R>(stream: R, label: String, is_stderr: bool) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    if is_stderr {
                        log::warn!(target: "polyshell::child", "[{}] {}", label, line);
                    } else {
                        log::info!(target: "polyshell::child", "[{}] {}", label, line);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("Reading output of '{}' failed: {}", label, e);
                    break;
                }
            }
        }
    })
}

/// Delivers `signal` to the child. A child that already exited is left alone.
#[cfg(unix)]
pub fn send_signal(child: &mut Child, signal: KillSignal) -> io::Result<()> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = i32::try_from(pid).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let signal = match signal {
        KillSignal::Interrupt => Signal::SIGINT,
        KillSignal::Terminate => Signal::SIGTERM,
        KillSignal::Kill => Signal::SIGKILL,
        KillSignal::Hangup => Signal::SIGHUP,
        KillSignal::Quit => Signal::SIGQUIT,
    };
    signal::kill(Pid::from_raw(pid), signal).map_err(io::Error::from)
}

/// Windows has no POSIX signals; every signal terminates the child.
#[cfg(not(unix))]
pub fn send_signal(child: &mut Child, signal: KillSignal) -> io::Result<()> {
    log::debug!("Terminating child for {} (no signal support on this platform).", signal);
    child.start_kill()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_args(line: &str) -> SpawnArgs {
        SpawnArgs::from_tokens(line.split(' ').map(str::to_string).collect())
    }

    #[test]
    fn test_shell_line_naive_is_verbatim() {
        let args = spawn_args("echo 'a b' && ls");
        assert_eq!(shell_line(&args, TokenizeMode::Naive), "echo 'a b' && ls");
    }

    #[test]
    fn test_shell_line_shlex_requotes_words() {
        let args = SpawnArgs {
            program: "echo".to_string(),
            args: vec!["a b".to_string(), "c".to_string()],
        };
        assert_eq!(shell_line(&args, TokenizeMode::Shlex), "echo 'a b' c");
    }

    #[test]
    fn test_cmd_exe_detection() {
        assert!(is_cmd_exe("cmd.exe"));
        assert!(is_cmd_exe(r"C:\Windows\System32\CMD.EXE"));
        assert!(!is_cmd_exe("/bin/bash"));
        assert!(!is_cmd_exe("pwsh"));
    }

    #[test]
    fn test_resolve_cwd_expands_home() {
        let resolved = resolve_cwd(std::path::Path::new("/tmp/project"));
        assert_eq!(resolved, PathBuf::from("/tmp/project"));

        if let Some(home) = dirs::home_dir() {
            let resolved = resolve_cwd(std::path::Path::new("~/project"));
            assert_eq!(resolved, home.join("project"));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_piped_output_is_consumed() {
        let options = SpawnOptions {
            stdio: StdioMode::Piped,
            ..SpawnOptions::default()
        };
        let mut command = build_command(&spawn_args("echo piped"), &options, TokenizeMode::Naive);
        let (mut child, forwarders) = spawn(&mut command, "test").unwrap();
        let status = child.wait().await.unwrap();
        for forwarder in forwarders {
            forwarder.await.unwrap();
        }
        assert!(status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invalid_utf8_output_keeps_pipe_open() {
        let options = SpawnOptions {
            stdio: StdioMode::Piped,
            ..SpawnOptions::default()
        };
        let line = "printf '\\377\\n'; sleep 0.3; i=0; while [ $i -lt 2000 ]; do echo line $i; i=$((i+1)); done";
        let args = SpawnArgs {
            program: line.to_string(),
            args: Vec::new(),
        };
        let mut command = build_command(&args, &options, TokenizeMode::Naive);
        let (mut child, forwarders) = spawn(&mut command, "test").unwrap();
        let status = child.wait().await.unwrap();
        for forwarder in forwarders {
            forwarder.await.unwrap();
        }
        assert!(status.success(), "child ended with {:?}", status);
    }
}
