// src/core/tables.rs

//! Built-in translation tables.
//!
//! Commands are written in the POSIX dialect; these tables describe how to
//! rewrite them for platforms that do not speak it natively. Only Windows
//! (`cmd.exe`) needs entries today.

use crate::models::{Platform, PlatformTranslations, TranslationTable};
use lazy_static::lazy_static;

lazy_static! {
    static ref DEFAULT_SHELL_TRANSLATIONS: PlatformTranslations = {
        let mut translations = PlatformTranslations::new();
        translations.set_table(Platform::Windows, windows_shell_table());
        translations
    };
    static ref DEFAULT_COMMAND_TRANSLATIONS: PlatformTranslations = {
        let mut translations = PlatformTranslations::new();
        translations.set_table(Platform::Windows, windows_command_table());
        translations
    };
}

/// Shell-level defaults: operators, special paths and variable syntax.
pub fn default_shell_translations() -> &'static PlatformTranslations {
    &DEFAULT_SHELL_TRANSLATIONS
}

/// Command-level defaults: the leading program name.
pub fn default_command_translations() -> &'static PlatformTranslations {
    &DEFAULT_COMMAND_TRANSLATIONS
}

fn windows_shell_table() -> TranslationTable {
    [
        (";", "&"),
        ("/dev/null", "NUL"),
        ("'", "\""),
        // ${NAME} and $NAME -> %NAME%
        (r"re:\$\{([A-Za-z_][A-Za-z0-9_]*)\}", "%$1%"),
        (r"re:\$([A-Za-z_][A-Za-z0-9_]*)", "%$1%"),
    ]
    .into_iter()
    .collect()
}

fn windows_command_table() -> TranslationTable {
    [
        ("rm", "del"),
        ("cp", "copy"),
        ("mv", "move"),
        ("ls", "dir"),
        ("cat", "type"),
        ("clear", "cls"),
        ("export", "set"),
        ("which", "where"),
        ("pwd", "cd"),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_platforms_have_no_defaults() {
        for platform in [Platform::Linux, Platform::Macos, Platform::Freebsd] {
            assert!(default_shell_translations().for_platform(platform).is_none());
            assert!(default_command_translations().for_platform(platform).is_none());
        }
    }

    #[test]
    fn test_windows_defaults() {
        let commands = default_command_translations()
            .for_platform(Platform::Windows)
            .unwrap();
        assert_eq!(commands.get("rm"), Some("del"));
        assert_eq!(commands.get("export"), Some("set"));

        let shell = default_shell_translations()
            .for_platform(Platform::Windows)
            .unwrap();
        assert_eq!(shell.get("/dev/null"), Some("NUL"));
        assert_eq!(shell.get(r"re:\$([A-Za-z_][A-Za-z0-9_]*)"), Some("%$1%"));
    }
}
