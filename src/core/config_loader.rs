// src/core/config_loader.rs

//! Loads a [`ShellConfig`] from a TOML file or from environment variables.

use crate::{
    constants::{CONFIG_DIR_NAME, CONFIG_FILENAME, LOG_ENV_VAR, OPTIONS_ENV_VAR, STRICT_ENV_VAR},
    models::{ShellConfig, SpawnOptions},
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Environment variable {name} has an invalid boolean value '{value}'.")]
    InvalidBool { name: &'static str, value: String },
    #[error("Environment variable {name} does not hold valid spawn options: {source}")]
    InvalidOptions {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Parses a config from TOML text. `origin` only names the source in errors.
pub fn parse_config(content: &str, origin: &str) -> Result<ShellConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::TomlParse {
        path: origin.to_string(),
        source,
    })
}

/// Reads and parses the TOML config file at `path`.
pub fn load_config(path: &Path) -> Result<ShellConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config = parse_config(&content, &path.display().to_string())?;
    log::debug!("Loaded config from '{}'.", path.display());
    Ok(config)
}

/// `<system config dir>/polyshell/config.toml`, whether or not it exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILENAME))
}

/// Loads the default config file if there is one.
pub fn load_default_config() -> Result<Option<ShellConfig>, ConfigError> {
    match default_config_path() {
        Some(path) if path.is_file() => load_config(&path).map(Some),
        _ => Ok(None),
    }
}

/// Builds a config from `POLYSHELL_LOG`, `POLYSHELL_STRICT` and `POLYSHELL_OPTIONS`.
pub fn config_from_env() -> Result<ShellConfig, ConfigError> {
    config_from_lookup(|name| std::env::var(name).ok())
}

/// Same as [`config_from_env`], reading variables through `lookup`.
pub fn config_from_lookup<F>(lookup: F) -> Result<ShellConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ShellConfig::default();
    if let Some(value) = lookup(LOG_ENV_VAR) {
        config.log = parse_bool(LOG_ENV_VAR, &value)?;
    }
    if let Some(value) = lookup(STRICT_ENV_VAR) {
        config.strict = parse_bool(STRICT_ENV_VAR, &value)?;
    }
    if let Some(value) = lookup(OPTIONS_ENV_VAR).filter(|v| !v.trim().is_empty()) {
        config.spawn = serde_json::from_str::<SpawnOptions>(&value).map_err(|source| {
            ConfigError::InvalidOptions {
                name: OPTIONS_ENV_VAR,
                source,
            }
        })?;
    }
    Ok(config)
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Platform, ShellMode, StdioMode, TokenizeMode};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
            log = true
            strict = true
            tokenizer = "shlex"
            platform = "win32"
            shell = false
            stdio = "ignore"
            cwd = "/tmp"

            [env]
            RUST_LOG = "debug"

            [command_translations.windows]
            grep = "findstr"

            [shell_translations.windows]
            "&&" = "&"
        "#;
        let config = parse_config(content, "inline").unwrap();
        assert!(config.log);
        assert!(config.strict);
        assert!(!config.silent);
        assert_eq!(config.tokenizer, TokenizeMode::Shlex);
        assert_eq!(config.platform, Some(Platform::Windows));
        assert_eq!(config.spawn.shell, ShellMode::Enabled(false));
        assert_eq!(config.spawn.stdio, StdioMode::Null);
        assert_eq!(config.spawn.cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(config.spawn.env.get("RUST_LOG").map(String::as_str), Some("debug"));
        assert_eq!(
            config
                .command_translations
                .for_platform(Platform::Windows)
                .and_then(|t| t.get("grep")),
            Some("findstr")
        );
        assert_eq!(
            config
                .shell_translations
                .for_platform(Platform::Windows)
                .and_then(|t| t.get("&&")),
            Some("&")
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("", "inline").unwrap();
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.spawn.shell, ShellMode::Enabled(true));
        assert_eq!(config.spawn.stdio, StdioMode::Inherit);
    }

    #[test]
    fn test_custom_shell_program() {
        let config = parse_config("shell = \"/bin/bash\"", "inline").unwrap();
        assert_eq!(config.spawn.shell, ShellMode::Program("/bin/bash".to_string()));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result = parse_config("log = maybe", "broken.toml");
        match result {
            Err(ConfigError::TomlParse { path, .. }) => assert_eq!(path, "broken.toml"),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"silent = true\n").unwrap();
        file.flush().unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.silent);
        assert!(load_config(Path::new("no_such_polyshell_config.toml")).is_err());
    }

    #[test]
    fn test_config_from_env_values() {
        let lookup = lookup_from(&[
            (LOG_ENV_VAR, "1"),
            (STRICT_ENV_VAR, "off"),
            (OPTIONS_ENV_VAR, r#"{"stdio": "piped", "cwd": "/var/tmp"}"#),
        ]);
        let config = config_from_lookup(lookup).unwrap();
        assert!(config.log);
        assert!(!config.strict);
        assert_eq!(config.spawn.stdio, StdioMode::Piped);
        assert_eq!(config.spawn.cwd, Some(PathBuf::from("/var/tmp")));
        assert_eq!(config.spawn.shell, ShellMode::Enabled(true));
    }

    #[test]
    fn test_config_from_env_rejects_bad_values() {
        let result = config_from_lookup(lookup_from(&[(STRICT_ENV_VAR, "sometimes")]));
        assert!(matches!(result, Err(ConfigError::InvalidBool { .. })));

        let result = config_from_lookup(lookup_from(&[(OPTIONS_ENV_VAR, "{not json")]));
        assert!(matches!(result, Err(ConfigError::InvalidOptions { .. })));
    }

    #[test]
    fn test_config_from_empty_env() {
        let config = config_from_lookup(|_| None).unwrap();
        assert_eq!(config, ShellConfig::default());
    }
}
