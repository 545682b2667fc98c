// src/core/translator.rs

//! Rewrites a POSIX-flavoured command line into the dialect of the target platform.
//!
//! Two tables drive the rewrite:
//! - the **shell table** rewrites operators and syntax anywhere in the line
//!   (`;`, `/dev/null`, `$HOME`, ...). At every position the longest matching
//!   key wins, so `&&` is never consumed as two `&`. Replaced text is not
//!   scanned again.
//! - the **command table** rewrites the leading program name only. Arguments
//!   are never looked up in it, so `rm -rf ./rm` only touches the first `rm`.
//!
//! On native platforms the line is only tokenized.

use crate::{
    constants::PATTERN_KEY_PREFIX,
    core::{command_line, tables},
    models::{Platform, PlatformTranslations, ShellConfig, SpawnArgs, TokenizeMode, TranslationTable},
};
use regex::Regex;

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    /// Anchored at the start of the remaining input.
    Pattern(Regex),
}

#[derive(Debug, Clone)]
struct ShellRule {
    matcher: Matcher,
    replacement: String,
}

/// A compiled, immutable translator for one platform.
#[derive(Debug, Clone)]
pub struct Translator {
    platform: Platform,
    tokenizer: TokenizeMode,
    shell_rules: Vec<ShellRule>,
    commands: TranslationTable,
}

impl Translator {
    /// Builds a translator from fully merged tables.
    pub fn new(
        platform: Platform,
        shell_translations: &PlatformTranslations,
        command_translations: &PlatformTranslations,
        tokenizer: TokenizeMode,
    ) -> Self {
        if platform.is_native() {
            return Self {
                platform,
                tokenizer,
                shell_rules: Vec::new(),
                commands: TranslationTable::new(),
            };
        }

        let shell_rules = shell_translations
            .for_platform(platform)
            .map(compile_rules)
            .unwrap_or_default();
        let commands = command_translations
            .for_platform(platform)
            .cloned()
            .unwrap_or_default();

        log::debug!(
            "Translator for '{}' built with {} shell rule(s) and {} command rule(s).",
            platform,
            shell_rules.len(),
            commands.len()
        );

        Self {
            platform,
            tokenizer,
            shell_rules,
            commands,
        }
    }

    /// Builds a translator from the built-in tables with the config's overrides applied.
    pub fn from_config(config: &ShellConfig) -> Self {
        let shell = tables::default_shell_translations().merged(&config.shell_translations);
        let commands = tables::default_command_translations().merged(&config.command_translations);
        Self::new(
            config.platform.unwrap_or_else(Platform::current),
            &shell,
            &commands,
            config.tokenizer,
        )
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn tokenizer(&self) -> TokenizeMode {
        self.tokenizer
    }

    /// Translates a single logical command line into spawnable arguments.
    /// Never fails: anything without a translation passes through untouched.
    pub fn translate(&self, command: &str) -> SpawnArgs {
        let rewritten = self.rewrite_shell_syntax(command);
        let mut spawn_args = SpawnArgs::from_tokens(command_line::tokenize(&rewritten, self.tokenizer));

        if let Some(program) = self.commands.get(&spawn_args.program) {
            log::debug!("Translated command '{}' -> '{}'.", spawn_args.program, program);
            spawn_args.program = program.to_string();
        }
        spawn_args
    }

    fn rewrite_shell_syntax(&self, line: &str) -> String {
        if self.shell_rules.is_empty() {
            return line.to_string();
        }

        let mut output = String::with_capacity(line.len());
        let mut pos = 0;
        while let Some(rest) = line.get(pos..) {
            let Some(next) = rest.chars().next() else {
                break;
            };
            match self.longest_match(rest) {
                Some((len, replacement)) => {
                    output.push_str(&replacement);
                    pos += len;
                }
                None => {
                    output.push(next);
                    pos += next.len_utf8();
                }
            }
        }
        output
    }

    /// Finds the longest rule matching at the start of `input`.
    /// Returns the matched length in bytes and the expanded replacement.
    fn longest_match(&self, input: &str) -> Option<(usize, String)> {
        let mut best: Option<(usize, String)> = None;
        for rule in &self.shell_rules {
            let candidate = match &rule.matcher {
                Matcher::Literal(key) => input
                    .starts_with(key.as_str())
                    .then(|| (key.len(), rule.replacement.clone())),
                Matcher::Pattern(re) => re.captures(input).and_then(|caps| {
                    let len = caps.get(0)?.end();
                    let mut expanded = String::new();
                    caps.expand(&rule.replacement, &mut expanded);
                    (len > 0).then_some((len, expanded))
                }),
            };
            if let Some((len, replacement)) = candidate
                && best.as_ref().is_none_or(|(best_len, _)| len > *best_len)
            {
                best = Some((len, replacement));
            }
        }
        best
    }
}

/// Compiles a table into rules sorted longest key first.
/// Keys written as `re:pattern` become anchored regexes; invalid patterns stay literal.
fn compile_rules(table: &TranslationTable) -> Vec<ShellRule> {
    table
        .entries_longest_first()
        .into_iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, replacement)| ShellRule {
            matcher: compile_matcher(key),
            replacement: replacement.to_string(),
        })
        .collect()
}

fn compile_matcher(key: &str) -> Matcher {
    let pattern = key.strip_prefix(PATTERN_KEY_PREFIX).filter(|p| !p.is_empty());

    match pattern {
        Some(pattern) => match Regex::new(&format!("^(?:{})", pattern)) {
            Ok(re) => Matcher::Pattern(re),
            Err(e) => {
                log::warn!("Translation key '{}' is not a valid pattern, matching it literally: {}", key, e);
                Matcher::Literal(key.to_string())
            }
        },
        None => Matcher::Literal(key.to_string()),
    }
}

/// Translates `command` for the current platform using the built-in tables
/// merged with the given overrides.
pub fn translate_for_platform(
    command: &str,
    custom_shell_translations: &PlatformTranslations,
    custom_command_translations: &PlatformTranslations,
) -> SpawnArgs {
    let config = ShellConfig {
        shell_translations: custom_shell_translations.clone(),
        command_translations: custom_command_translations.clone(),
        ..ShellConfig::default()
    };
    Translator::from_config(&config).translate(command)
}
