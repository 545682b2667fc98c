// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

// --- PLATFORM ---

/// The operating system family a command is translated for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux and other POSIX-like systems without a dedicated entry.
    Linux,
    /// macOS.
    #[serde(alias = "darwin")]
    Macos,
    /// FreeBSD.
    Freebsd,
    /// Windows, targeting the `cmd.exe` dialect.
    #[serde(alias = "win32")]
    Windows,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown platform '{0}'. Expected one of: linux, macos, freebsd, windows.")]
pub struct ParsePlatformError(pub String);

impl Platform {
    /// Detects the platform this process is running on.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "macos" => Self::Macos,
            "freebsd" => Self::Freebsd,
            _ => Self::Linux,
        }
    }

    /// Whether commands written for a POSIX shell run here as-is.
    ///
    /// Translation tables are written in the POSIX dialect, so native platforms
    /// never have their commands rewritten.
    pub fn is_native(self) -> bool {
        !matches!(self, Self::Windows)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Freebsd => "freebsd",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::Macos),
            "freebsd" => Ok(Self::Freebsd),
            "windows" | "win32" => Ok(Self::Windows),
            _ => Err(ParsePlatformError(s.to_string())),
        }
    }
}

// --- TRANSLATION MODELS ---

/// The result of translating a command: the program to spawn and its arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnArgs {
    pub program: String,
    pub args: Vec<String>,
}

impl SpawnArgs {
    /// Splits a token list into program and arguments. An empty list yields an empty program.
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let mut tokens = tokens.into_iter();
        let program = tokens.next().unwrap_or_default();
        Self {
            program,
            args: tokens.collect(),
        }
    }

    /// Reassembles the command line as it would be handed to a shell.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            return self.program.clone();
        }
        format!("{} {}", self.program, self.args.join(" "))
    }
}

impl fmt::Display for SpawnArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// A mapping from a canonical token to its platform-specific replacement.
///
/// Keys prefixed with `re:` (`re:\$(\w+)`) are regular expressions; their
/// replacement may reference capture groups (`%$1%`). All other keys are
/// literal, including paths such as `/tmp/`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct TranslationTable(BTreeMap<String, String>);

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) -> Option<String> {
        self.0.insert(from.into(), to.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a copy of this table with `overrides` applied on top.
    /// Entries from `overrides` win on key collision.
    pub fn merged(&self, overrides: &Self) -> Self {
        let mut merged = self.clone();
        merged
            .0
            .extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Entries ordered by key length, longest first. Ties are broken alphabetically
    /// so the order never depends on map iteration.
    pub fn entries_longest_first(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self.iter().collect();
        entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationTable {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One translation table per target platform.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PlatformTranslations(HashMap<Platform, TranslationTable>);

impl PlatformTranslations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_platform(&self, platform: Platform) -> Option<&TranslationTable> {
        self.0.get(&platform)
    }

    /// Adds a single translation for `platform`, replacing any existing entry for `from`.
    pub fn insert(&mut self, platform: Platform, from: impl Into<String>, to: impl Into<String>) {
        self.0.entry(platform).or_default().insert(from, to);
    }

    pub fn set_table(&mut self, platform: Platform, table: TranslationTable) {
        self.0.insert(platform, table);
    }

    /// Merges `overrides` into a copy of `self`, platform by platform.
    pub fn merged(&self, overrides: &Self) -> Self {
        let mut merged = self.clone();
        for (platform, table) in &overrides.0 {
            let base = merged.0.remove(platform).unwrap_or_default();
            merged.0.insert(*platform, base.merged(table));
        }
        merged
    }
}

// --- EXECUTION OPTIONS ---

/// How a command line is split into program and argument tokens.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenizeMode {
    /// Split on single spaces. No quoting or escaping.
    #[default]
    Naive,
    /// Quote and escape aware splitting with POSIX shell rules.
    Shlex,
}

/// Whether commands run through a shell, and which one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ShellMode {
    /// `true` runs through the platform shell, `false` spawns the program directly.
    Enabled(bool),
    /// Runs through the named shell program.
    Program(String),
}

impl Default for ShellMode {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

/// Where the child's standard streams go.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StdioMode {
    /// Share the parent's stdin, stdout and stderr.
    #[default]
    Inherit,
    /// Discard all output and provide an empty stdin.
    #[serde(alias = "ignore")]
    Null,
    /// Capture stdout and stderr and forward each line to the log.
    Piped,
}

/// Options forwarded to the process spawner.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SpawnOptions {
    pub shell: ShellMode,
    pub stdio: StdioMode,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    /// Start the child with an empty environment before applying `env`.
    pub clear_env: bool,
}

/// Termination signals that can be forwarded to a running child.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KillSignal {
    /// SIGINT
    #[serde(rename = "SIGINT")]
    Interrupt,
    /// SIGTERM
    #[default]
    #[serde(rename = "SIGTERM")]
    Terminate,
    /// SIGKILL
    #[serde(rename = "SIGKILL")]
    Kill,
    /// SIGHUP
    #[serde(rename = "SIGHUP")]
    Hangup,
    /// SIGQUIT
    #[serde(rename = "SIGQUIT")]
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown signal '{0}'. Expected one of: SIGINT, SIGTERM, SIGKILL, SIGHUP, SIGQUIT.")]
pub struct ParseSignalError(pub String);

impl KillSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Kill => "SIGKILL",
            Self::Hangup => "SIGHUP",
            Self::Quit => "SIGQUIT",
        }
    }
}

impl fmt::Display for KillSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KillSignal {
    type Err = ParseSignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.strip_prefix("SIG").unwrap_or(&upper) {
            "INT" => Ok(Self::Interrupt),
            "TERM" => Ok(Self::Terminate),
            "KILL" => Ok(Self::Kill),
            "HUP" => Ok(Self::Hangup),
            "QUIT" => Ok(Self::Quit),
            _ => Err(ParseSignalError(s.to_string())),
        }
    }
}

// --- SHELL CONFIGURATION ---

/// Everything needed to build a [`crate::system::executor::Shell`].
///
/// Deserializable from TOML, with every field optional:
///
/// ```toml
/// log = true
/// strict = false
/// stdio = "inherit"
/// cwd = "~/projects/app"
///
/// [env]
/// RUST_LOG = "debug"
///
/// [command_translations.windows]
/// grep = "findstr"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ShellConfig {
    /// Print each command before running it.
    pub log: bool,
    /// Terminate the host process with status 1 when a command fails.
    pub strict: bool,
    /// Discard child output and suppress the command banner.
    pub silent: bool,
    pub tokenizer: TokenizeMode,
    /// Overrides platform detection.
    pub platform: Option<Platform>,
    /// Overrides for the leading command name, merged over the built-in tables.
    pub command_translations: PlatformTranslations,
    /// Overrides for shell operators and syntax, merged over the built-in tables.
    pub shell_translations: PlatformTranslations,
    #[serde(flatten)]
    pub spawn: SpawnOptions,
}

impl ShellConfig {
    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: TokenizeMode) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.spawn.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spawn.env.insert(key.into(), value.into());
        self
    }

    pub fn with_shell_mode(mut self, shell: ShellMode) -> Self {
        self.spawn.shell = shell;
        self
    }

    pub fn with_stdio(mut self, stdio: StdioMode) -> Self {
        self.spawn.stdio = stdio;
        self
    }

    pub fn with_command_translation(
        mut self,
        platform: Platform,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.command_translations.insert(platform, from, to);
        self
    }

    pub fn with_shell_translation(
        mut self,
        platform: Platform,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.shell_translations.insert(platform, from, to);
        self
    }

    /// The spawn options actually used, after `silent` is taken into account.
    pub fn effective_spawn_options(&self) -> SpawnOptions {
        let mut options = self.spawn.clone();
        if self.silent {
            options.stdio = StdioMode::Null;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parsing_accepts_aliases() {
        assert_eq!("win32".parse::<Platform>(), Ok(Platform::Windows));
        assert_eq!("Darwin".parse::<Platform>(), Ok(Platform::Macos));
        assert!("plan9".parse::<Platform>().is_err());
        assert!(Platform::Linux.is_native());
        assert!(!Platform::Windows.is_native());
    }

    #[test]
    fn test_kill_signal_parsing() {
        assert_eq!("SIGINT".parse::<KillSignal>(), Ok(KillSignal::Interrupt));
        assert_eq!("term".parse::<KillSignal>(), Ok(KillSignal::Terminate));
        assert_eq!("sigkill".parse::<KillSignal>(), Ok(KillSignal::Kill));
        assert_eq!(KillSignal::default(), KillSignal::Terminate);
        assert!("SIGFOO".parse::<KillSignal>().is_err());
    }

    #[test]
    fn test_spawn_args_from_tokens() {
        let args = SpawnArgs::from_tokens(vec!["ls".into(), "-la".into(), "src".into()]);
        assert_eq!(args.program, "ls");
        assert_eq!(args.args, vec!["-la", "src"]);
        assert_eq!(args.to_string(), "ls -la src");

        let empty = SpawnArgs::from_tokens(Vec::new());
        assert_eq!(empty.program, "");
        assert!(empty.args.is_empty());
    }

    #[test]
    fn test_table_merge_prefers_overrides() {
        let defaults: TranslationTable = [("rm", "del"), ("ls", "dir")].into_iter().collect();
        let overrides: TranslationTable = [("rm", "erase")].into_iter().collect();
        let merged = defaults.merged(&overrides);
        assert_eq!(merged.get("rm"), Some("erase"));
        assert_eq!(merged.get("ls"), Some("dir"));
    }

    #[test]
    fn test_entries_longest_first() {
        let table: TranslationTable = [("&", "a"), ("&&", "b"), ("|", "c")].into_iter().collect();
        let keys: Vec<&str> = table.entries_longest_first().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["&&", "&", "|"]);
    }

    #[test]
    fn test_platform_translations_merge_per_platform() {
        let mut defaults = PlatformTranslations::new();
        defaults.insert(Platform::Windows, "rm", "del");
        let mut overrides = PlatformTranslations::new();
        overrides.insert(Platform::Windows, "cat", "type");
        overrides.insert(Platform::Macos, "ls", "gls");

        let merged = defaults.merged(&overrides);
        let windows = merged.for_platform(Platform::Windows).unwrap();
        assert_eq!(windows.get("rm"), Some("del"));
        assert_eq!(windows.get("cat"), Some("type"));
        assert_eq!(
            merged.for_platform(Platform::Macos).unwrap().get("ls"),
            Some("gls")
        );
    }

    #[test]
    fn test_silent_forces_null_stdio() {
        let config = ShellConfig::default().with_silent(true);
        assert_eq!(config.effective_spawn_options().stdio, StdioMode::Null);
        assert_eq!(
            ShellConfig::default().effective_spawn_options().stdio,
            StdioMode::Inherit
        );
    }
}
