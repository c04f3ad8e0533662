//! The command table: one entry per shell command, with its vocabulary
//! spellings, recognition pattern, and help text colocated.
//!
//! Recognition is anchored at both ends, case-insensitive, treats the
//! spaces inside a pattern as flexible runs of whitespace, and accepts an
//! optional leading `help` word that turns the command into a help lookup.

use once_cell::sync::Lazy;
use regex::Regex;

use kiln_tui::CommandVocabulary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Exit,
    PrintRuntimes,
    SetRuntime,
    SetConfig,
    SetDebug,
    SetDrive,
    SetPrefix,
    SetProject,
    BuildWine,
    CleanBuild,
    KillServer,
    ExportAutoload,
}

pub struct CommandSpec {
    /// Vocabulary spellings offered by autocomplete.
    pub spellings: &'static [&'static str],
    /// Recognition pattern; spaces become flexible whitespace runs.
    pattern: &'static str,
    pub help: &'static [&'static str],
    pub kind: CommandKind,
}

pub static COMMAND_TABLE: &[CommandSpec] = &[
    CommandSpec {
        spellings: &["exit", "quit"],
        pattern: "(exit|quit)",
        help: &["immediately terminates the program"],
        kind: CommandKind::Exit,
    },
    CommandSpec {
        spellings: &["print runtimes"],
        pattern: "print runtimes",
        help: &["lists recognized GameMaker build runtimes"],
        kind: CommandKind::PrintRuntimes,
    },
    CommandSpec {
        spellings: &["set gm runtime", "set gamemaker runtime"],
        pattern: "set (gm|gamemaker) runtime",
        help: &["opens a list to select which GameMaker runtime to compile with"],
        kind: CommandKind::SetRuntime,
    },
    CommandSpec {
        spellings: &["set gm config", "set gamemaker config"],
        pattern: "set (gm|gamemaker) config",
        help: &["opens a list to select which GameMaker config to compile with"],
        kind: CommandKind::SetConfig,
    },
    CommandSpec {
        spellings: &["set debug"],
        pattern: "set debug",
        help: &["opens a list to select whether or not to compile with debugging enabled"],
        kind: CommandKind::SetDebug,
    },
    CommandSpec {
        spellings: &["set wine drive"],
        pattern: "set wine drive",
        help: &[
            "opens a list to select which drive letter is being used by WINE to point to drive's root directory",
        ],
        kind: CommandKind::SetDrive,
    },
    CommandSpec {
        spellings: &["set wine prefix"],
        pattern: "set wine prefix",
        help: &[
            "opens a list to select which WINE prefix should be used and scanned for GameMaker executables",
        ],
        kind: CommandKind::SetPrefix,
    },
    CommandSpec {
        spellings: &["set gm project", "set gamemaker project"],
        pattern: "set (gm|gamemaker) project",
        help: &["opens a list to select which GameMaker project should be compiled on the next build"],
        kind: CommandKind::SetProject,
    },
    CommandSpec {
        spellings: &["build wine", "build wine existing"],
        pattern: "build wine( existing)?",
        help: &[
            "begins a build of the currently active project",
            "if 'existing' is specified the first build-properties file found in the active WINE prefix will be used instead of generating a new file",
        ],
        kind: CommandKind::BuildWine,
    },
    CommandSpec {
        spellings: &["clean wine build"],
        pattern: "clean wine build",
        help: &["deletes all cached GameMaker builds and build files"],
        kind: CommandKind::CleanBuild,
    },
    CommandSpec {
        spellings: &["kill wineserver"],
        pattern: "kill wineserver",
        help: &["forcefully kills any background running WINE processes"],
        kind: CommandKind::KillServer,
    },
    CommandSpec {
        spellings: &["export autoload"],
        pattern: "export autoload",
        help: &["exports build settings to your home directory to be auto-loaded next startup"],
        kind: CommandKind::ExportAutoload,
    },
];

struct CompiledCommand {
    spec: &'static CommandSpec,
    regex: Regex,
}

static COMPILED_TABLE: Lazy<Vec<CompiledCommand>> = Lazy::new(|| {
    COMMAND_TABLE
        .iter()
        .map(|spec| CompiledCommand {
            spec,
            regex: compile_pattern(spec.pattern),
        })
        .collect()
});

static BARE_HELP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[ \t]*help[ \t]*$").expect("bare help pattern"));

fn compile_pattern(pattern: &str) -> Regex {
    let flexible = pattern.replace(' ', r"[ \t]*");
    let anchored = format!(r"(?i)^[ \t]*(help[ \t]+)?{flexible}[ \t]*$");
    Regex::new(&anchored).expect("command pattern compiles")
}

/// Result of recognizing one submitted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognized {
    /// Whitespace-only input; ignored.
    Blank,
    /// The bare `help` word: list all base commands.
    HelpIndex,
    Command {
        kind: CommandKind,
        /// The line was `help <command>`.
        help: bool,
        /// `build wine existing` rather than `build wine`.
        existing: bool,
    },
    Invalid,
}

pub fn recognize(input: &str) -> Recognized {
    if input.trim().is_empty() {
        return Recognized::Blank;
    }
    if BARE_HELP.is_match(input) {
        return Recognized::HelpIndex;
    }

    for compiled in COMPILED_TABLE.iter() {
        if let Some(captures) = compiled.regex.captures(input) {
            let help = captures.get(1).is_some();
            let existing = compiled.spec.kind == CommandKind::BuildWine
                && input.to_ascii_lowercase().contains("existing");
            return Recognized::Command {
                kind: compiled.spec.kind,
                help,
                existing,
            };
        }
    }

    Recognized::Invalid
}

/// Help lines for a command kind.
pub fn help_lines(kind: CommandKind) -> &'static [&'static str] {
    COMMAND_TABLE
        .iter()
        .find(|spec| spec.kind == kind)
        .map(|spec| spec.help)
        .unwrap_or(&[])
}

/// Autocomplete vocabulary: every spelling, a `help `-prefixed variant of
/// each, and the bare `help`, pre-sorted.
pub fn vocabulary() -> CommandVocabulary {
    let mut entries: Vec<String> = COMMAND_TABLE
        .iter()
        .flat_map(|spec| spec.spellings.iter().map(|s| s.to_string()))
        .collect();
    let base = entries.clone();
    for spelling in base {
        entries.push(format!("help {spelling}"));
    }
    entries.push("help".to_string());
    CommandVocabulary::new(entries)
}

#[cfg(test)]
mod tests {
    use super::{recognize, vocabulary, CommandKind, Recognized};

    #[test]
    fn plain_commands_are_recognized() {
        assert_eq!(
            recognize("exit"),
            Recognized::Command {
                kind: CommandKind::Exit,
                help: false,
                existing: false,
            }
        );
        assert_eq!(
            recognize("quit"),
            Recognized::Command {
                kind: CommandKind::Exit,
                help: false,
                existing: false,
            }
        );
    }

    #[test]
    fn recognition_is_case_insensitive() {
        assert!(matches!(
            recognize("Set GM Runtime"),
            Recognized::Command {
                kind: CommandKind::SetRuntime,
                help: false,
                ..
            }
        ));
    }

    #[test]
    fn internal_whitespace_is_flexible() {
        assert!(matches!(
            recognize("  set   wine\tprefix "),
            Recognized::Command {
                kind: CommandKind::SetPrefix,
                ..
            }
        ));
        // Collapsed whitespace also matches, per the zero-or-more rule.
        assert!(matches!(
            recognize("setwineprefix"),
            Recognized::Command {
                kind: CommandKind::SetPrefix,
                ..
            }
        ));
    }

    #[test]
    fn alternation_covers_both_spellings() {
        for input in ["set gm project", "set gamemaker project"] {
            assert!(matches!(
                recognize(input),
                Recognized::Command {
                    kind: CommandKind::SetProject,
                    ..
                }
            ));
        }
    }

    #[test]
    fn help_prefix_turns_into_a_help_lookup() {
        assert_eq!(
            recognize("help build wine"),
            Recognized::Command {
                kind: CommandKind::BuildWine,
                help: true,
                existing: false,
            }
        );
    }

    #[test]
    fn bare_help_lists_commands() {
        assert_eq!(recognize("help"), Recognized::HelpIndex);
        assert_eq!(recognize("  HELP  "), Recognized::HelpIndex);
    }

    #[test]
    fn build_wine_existing_sets_the_flag() {
        assert_eq!(
            recognize("build wine existing"),
            Recognized::Command {
                kind: CommandKind::BuildWine,
                help: false,
                existing: true,
            }
        );
        assert_eq!(
            recognize("build wine"),
            Recognized::Command {
                kind: CommandKind::BuildWine,
                help: false,
                existing: false,
            }
        );
    }

    #[test]
    fn unknown_and_blank_inputs() {
        assert_eq!(recognize("frobnicate"), Recognized::Invalid);
        assert_eq!(recognize("   "), Recognized::Blank);
        assert_eq!(recognize(""), Recognized::Blank);
    }

    #[test]
    fn anchoring_rejects_trailing_garbage() {
        assert_eq!(recognize("exit now"), Recognized::Invalid);
        assert_eq!(recognize("do exit"), Recognized::Invalid);
    }

    #[test]
    fn vocabulary_is_sorted_and_contains_help_variants() {
        let vocab = vocabulary();
        let entries = vocab.entries();
        let mut sorted = entries.to_vec();
        sorted.sort();
        assert_eq!(entries, sorted.as_slice());

        assert!(entries.iter().any(|e| e == "exit"));
        assert!(entries.iter().any(|e| e == "help exit"));
        assert!(entries.iter().any(|e| e == "help"));
        assert!(entries.iter().any(|e| e == "build wine existing"));
    }

    #[test]
    fn prompt_completion_scenario() {
        let vocab = vocabulary();
        let matched = vocab.best_match("exp").expect("match");
        assert_eq!(matched.hint, "ort autoload");
    }
}
