// src/core/command_line.rs

//! Turns raw, possibly multiline command strings into a single logical command line.
//!
//! ```text
//! google-closure-compiler            google-closure-compiler \
//!   -O ADVANCED              ->        -O ADVANCED \
//!   --js ./main.js                     --js ./main.js
//! ```

use crate::{constants::CONTINUATION_MARKER, models::TokenizeMode};

/// Trims the command and reflows it into continuation form.
pub fn prepare(raw: &str) -> String {
    reflow(raw.trim())
}

/// Appends a continuation marker to every line except the last, unless the line
/// already ends with one (trailing whitespace after the marker is tolerated).
/// A string without newlines is returned unchanged.
pub fn reflow(command: &str) -> String {
    if !command.contains('\n') {
        return command.to_string();
    }

    let lines: Vec<&str> = command.split('\n').collect();
    let last = lines.len().saturating_sub(1);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i < last && !ends_with_continuation(line) {
                format!("{} {}", line, CONTINUATION_MARKER)
            } else {
                (*line).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn ends_with_continuation(line: &str) -> bool {
    line.trim_end().ends_with(CONTINUATION_MARKER)
}

/// Splits a command line into tokens according to `mode`.
///
/// `Naive` splits on every single space, so consecutive spaces yield empty tokens
/// and quotes are kept verbatim. `Shlex` falls back to `Naive` when the line has
/// unbalanced quotes.
pub fn tokenize(line: &str, mode: TokenizeMode) -> Vec<String> {
    match mode {
        TokenizeMode::Naive => split_naive(line),
        TokenizeMode::Shlex => match shlex::split(line) {
            Some(tokens) if !tokens.is_empty() => tokens,
            Some(_) => vec![String::new()],
            None => {
                log::debug!("Could not lex '{}' with shell rules, splitting on spaces.", line);
                split_naive(line)
            }
        },
    }
}

fn split_naive(line: &str) -> Vec<String> {
    line.split(' ').map(str::to_string).collect()
}
