// src/constants.rs

/// Marker appended to a line to continue a logical command on the next line.
pub const CONTINUATION_MARKER: char = '\\';

/// Program name whose invocations are never echoed by the command banner.
pub const ECHO_PROGRAM: &str = "echo";

/// Environment variable enabling the command banner for the default shell.
pub const LOG_ENV_VAR: &str = "POLYSHELL_LOG";

/// Environment variable enabling strict mode for the default shell.
pub const STRICT_ENV_VAR: &str = "POLYSHELL_STRICT";

/// Environment variable holding JSON-encoded spawn options for the default shell.
pub const OPTIONS_ENV_VAR: &str = "POLYSHELL_OPTIONS";

/// The name of the directory holding polyshell configuration (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "polyshell";

/// The name of the default configuration file (inside the polyshell config dir).
pub const CONFIG_FILENAME: &str = "config.toml";

/// Exit status used when strict mode terminates the host process.
pub const STRICT_EXIT_CODE: i32 = 1;

/// Prefix marking a translation key as a regular expression (`re:\$(\w+)`).
pub const PATTERN_KEY_PREFIX: &str = "re:";

/// POSIX shell used for shell-mode execution on Unix.
pub const POSIX_SHELL: &str = "/bin/sh";

/// Command interpreter used for shell-mode execution on Windows.
pub const WINDOWS_SHELL: &str = "cmd.exe";
