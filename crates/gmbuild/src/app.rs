//! Session state and command dispatch.
//!
//! One explicit `Session` value holds everything the shell knows — the old
//! ambient globals of tools like this, collected behind a single door. The
//! dispatcher is pure with respect to the terminal: it mutates session
//! state, appends history lines, and returns an [`Action`] for the UI layer
//! to perform.

use autoload_store::AutoloadSnapshot;
use kiln_tui::{HistoryBuffer, InputHistory};

use crate::commands::{self, CommandKind, Recognized};
use crate::discovery;

pub const DRIVE_LETTERS: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// What the UI layer should do after a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Exit,
    OpenRuntimeSelect,
    OpenConfigSelect,
    OpenDebugSelect,
    OpenDriveSelect,
    OpenPrefixSelect,
    OpenProjectSelect,
    StartBuild { use_existing: bool },
    PrintRuntimes,
    CleanBuild,
    KillServer,
    ExportAutoload,
}

#[derive(Debug)]
pub struct Session {
    pub user: String,

    pub prefix_path: String,
    pub gm_exe_path: String,
    pub variant_suffix: String,
    pub user_dir: String,

    pub runtime_root: String,
    pub runtime_name: String,
    pub runtime_index: Option<usize>,

    pub project_path: String,
    pub project_dir: String,
    pub project_name: String,

    pub config_name: String,
    pub config_index: usize,

    pub drive_letter: char,
    pub drive_index: Option<usize>,
    pub debug_enabled: bool,

    pub history: HistoryBuffer,
    pub input_history: InputHistory,
    pub should_exit: bool,
    pub restored_from_snapshot: bool,
}

impl Session {
    pub fn new(user: &str) -> Self {
        Self {
            user: user.to_string(),
            prefix_path: format!("/home/{user}/.wine"),
            gm_exe_path: String::new(),
            variant_suffix: String::new(),
            user_dir: String::new(),
            runtime_root: String::new(),
            runtime_name: String::new(),
            runtime_index: None,
            project_path: String::new(),
            project_dir: String::new(),
            project_name: String::new(),
            config_name: "Default".to_string(),
            config_index: 0,
            drive_letter: 'Z',
            drive_index: None,
            debug_enabled: false,
            history: HistoryBuffer::new(),
            input_history: InputHistory::new(),
            should_exit: false,
            restored_from_snapshot: false,
        }
    }

    pub fn home_dir(&self) -> String {
        format!("/home/{}", self.user)
    }

    /// Runtime folder the active selection points at.
    pub fn runtime_dir(&self) -> String {
        format!("{}{}", self.runtime_root, self.runtime_name)
    }

    pub fn has_project(&self) -> bool {
        !self.project_name.is_empty()
    }

    pub fn has_runtime(&self) -> bool {
        self.runtime_index.is_some() && !self.runtime_name.is_empty()
    }

    /// Append a plain line to the rendered log.
    pub fn note(&mut self, text: impl Into<String>) {
        self.history.append(text.into());
    }

    /// Append an urgent advisory line to the rendered log.
    pub fn advisory(&mut self, text: impl AsRef<str>) {
        self.history.append(format!("[!] {}", text.as_ref()));
    }

    /// Restore selections from a snapshot, deriving the project name and
    /// directory the same way a fresh selection would. Returns false (and
    /// restores nothing) when the project path in the snapshot is unusable.
    pub fn apply_snapshot(&mut self, snapshot: &AutoloadSnapshot) -> bool {
        let Some((name, dir)) = discovery::project_name_and_dir(&snapshot.project_path) else {
            return false;
        };

        self.project_path = snapshot.project_path.clone();
        self.project_name = name;
        self.project_dir = dir;
        self.prefix_path = snapshot.prefix_path.clone();
        self.runtime_root = snapshot.runtime_path.clone();
        self.runtime_name = snapshot.runtime_name.clone();
        self.runtime_index = Some(0);
        self.debug_enabled = snapshot.debug_enabled();
        self.drive_letter = snapshot
            .drive_letter
            .chars()
            .next()
            .unwrap_or('Z')
            .to_ascii_uppercase();
        self.drive_index = DRIVE_LETTERS
            .iter()
            .position(|&letter| letter == self.drive_letter);
        self.config_name = snapshot.config_name.clone();
        self.variant_suffix = snapshot.variant_suffix.clone();
        self.restored_from_snapshot = true;
        true
    }

    /// Capture the current selections for export.
    pub fn snapshot(&self) -> AutoloadSnapshot {
        AutoloadSnapshot {
            project_path: self.project_path.clone(),
            prefix_path: self.prefix_path.clone(),
            runtime_path: self.runtime_root.clone(),
            runtime_name: self.runtime_name.clone(),
            debug: u8::from(self.debug_enabled),
            drive_letter: self.drive_letter.to_string(),
            config_name: self.config_name.clone(),
            variant_suffix: self.variant_suffix.clone(),
            exported_at: None,
        }
    }

    /// Handle one submitted prompt line: record it, recognize it, apply any
    /// state changes that need no UI, and report what the UI must do next.
    pub fn dispatch_submitted(&mut self, line: &str) -> Action {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            self.history.append(line.to_string());
            self.input_history.record_entry(line.to_string());
        }

        match commands::recognize(line) {
            Recognized::Blank => Action::None,
            Recognized::Invalid => {
                self.note("invalid command!");
                Action::None
            }
            Recognized::HelpIndex => {
                self.push_help_index();
                Action::None
            }
            Recognized::Command { kind, help: true, .. } => {
                self.advisory("info:");
                for line in commands::help_lines(kind) {
                    self.note(*line);
                }
                Action::None
            }
            Recognized::Command {
                kind, existing, ..
            } => self.perform_command(kind, existing),
        }
    }

    fn push_help_index(&mut self) {
        self.advisory("info:");
        self.note("available commands:");
        let base: Vec<String> = commands::vocabulary()
            .base_entries()
            .map(|entry| format!("- {entry}"))
            .collect();
        for line in base {
            self.note(line);
        }
        self.note("you can find more info on a specific command by typing `help [command]`");
    }

    fn perform_command(&mut self, kind: CommandKind, existing: bool) -> Action {
        match kind {
            CommandKind::Exit => {
                self.should_exit = true;
                Action::Exit
            }
            CommandKind::PrintRuntimes => Action::PrintRuntimes,
            CommandKind::SetRuntime => Action::OpenRuntimeSelect,
            CommandKind::SetConfig => Action::OpenConfigSelect,
            CommandKind::SetDebug => Action::OpenDebugSelect,
            CommandKind::SetDrive => Action::OpenDriveSelect,
            CommandKind::SetPrefix => Action::OpenPrefixSelect,
            CommandKind::SetProject => Action::OpenProjectSelect,
            CommandKind::CleanBuild => Action::CleanBuild,
            CommandKind::KillServer => Action::KillServer,
            CommandKind::ExportAutoload => Action::ExportAutoload,
            CommandKind::BuildWine => {
                // Dependent state is re-checked here, not assumed from the
                // screens that normally set it.
                let mut valid = true;
                if !self.has_project() {
                    valid = false;
                    self.advisory("please select a valid GameMaker project before building!");
                }
                if !self.has_runtime() {
                    valid = false;
                    self.advisory("please select a valid runtime before building!");
                }
                if !valid {
                    return Action::None;
                }
                Action::StartBuild {
                    use_existing: existing,
                }
            }
        }
    }

    /// Record a confirmed prefix selection and reset everything scanned
    /// from the old prefix.
    pub fn set_prefix(&mut self, prefix: String) {
        self.prefix_path = prefix;
        self.note(format!("WINE prefix set to {}", self.prefix_path));
        self.runtime_name.clear();
        self.runtime_root.clear();
        self.runtime_index = None;
    }

    pub fn set_runtime(&mut self, root: String, name: String, index: usize) {
        self.runtime_root = root;
        self.runtime_name = name;
        self.runtime_index = Some(index);
        self.note(format!("GameMaker runtime set to {}", self.runtime_name));
    }

    /// Record a confirmed project selection; fails (with an advisory) when
    /// the file name has characters outside the supported set.
    pub fn set_project(&mut self, project_path: String) -> bool {
        match discovery::project_name_and_dir(&project_path) {
            Some((name, dir)) => {
                self.project_path = project_path;
                self.project_name = name;
                self.project_dir = dir;
                self.config_name = "Default".to_string();
                self.config_index = 0;
                self.note(format!("project set to {}", self.project_name));
                true
            }
            None => {
                self.advisory("error processing project name (invalid characters?)");
                false
            }
        }
    }

    pub fn set_config(&mut self, label: &str, index: usize) {
        self.config_name = discovery::config_leaf_name(label);
        self.config_index = index;
        self.note(format!("GameMaker config set to {}", self.config_name));
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug_enabled = enabled;
        self.note(format!(
            "debug mode {}",
            if enabled { "enabled" } else { "disabled" }
        ));
    }

    pub fn set_drive(&mut self, index: usize) {
        let letter = DRIVE_LETTERS.get(index).copied().unwrap_or('Z');
        self.drive_letter = letter;
        self.drive_index = Some(index);
        self.note(format!("WINE drive specified as {letter}:\\"));
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Session};

    #[test]
    fn invalid_command_appends_exactly_one_notice() {
        let mut session = Session::new("um");
        let before_len = session.history.len();
        let action = session.dispatch_submitted("frobnicate");

        assert_eq!(action, Action::None);
        // The submitted line itself plus the notice.
        assert_eq!(session.history.len(), before_len + 2);
        assert_eq!(
            session.history.line(before_len + 1).unwrap().text,
            "invalid command!"
        );
        assert!(!session.should_exit);
        assert!(!session.has_project());
    }

    #[test]
    fn blank_input_is_ignored_entirely() {
        let mut session = Session::new("um");
        let action = session.dispatch_submitted("   ");
        assert_eq!(action, Action::None);
        assert!(session.history.is_empty());
        assert!(session.input_history.entries().is_empty());
    }

    #[test]
    fn submitted_lines_are_recorded_in_both_histories() {
        let mut session = Session::new("um");
        session.dispatch_submitted("set debug");
        assert_eq!(session.input_history.entries(), ["set debug"]);
        assert_eq!(session.history.line(0).unwrap().text, "set debug");
    }

    #[test]
    fn exit_and_quit_both_terminate() {
        for word in ["exit", "quit", "EXIT"] {
            let mut session = Session::new("um");
            assert_eq!(session.dispatch_submitted(word), Action::Exit);
            assert!(session.should_exit);
        }
    }

    #[test]
    fn build_refuses_without_project_and_runtime() {
        let mut session = Session::new("um");
        let action = session.dispatch_submitted("build wine");
        assert_eq!(action, Action::None);

        let text: Vec<String> = session
            .history
            .lines()
            .iter()
            .map(|line| line.text.clone())
            .collect();
        assert!(text
            .iter()
            .any(|line| line.contains("select a valid GameMaker project")));
        assert!(text.iter().any(|line| line.contains("select a valid runtime")));
    }

    #[test]
    fn build_with_selections_starts_and_carries_the_existing_flag() {
        let mut session = Session::new("um");
        session.set_project("/home/um/dev/game/game.yyp".to_string());
        session.set_runtime("/rt/".to_string(), "runtime-2.3".to_string(), 0);

        assert_eq!(
            session.dispatch_submitted("build wine"),
            Action::StartBuild {
                use_existing: false
            }
        );
        assert_eq!(
            session.dispatch_submitted("build wine existing"),
            Action::StartBuild { use_existing: true }
        );
    }

    #[test]
    fn help_lookup_appends_info_lines() {
        let mut session = Session::new("um");
        session.dispatch_submitted("help exit");
        let text: Vec<String> = session
            .history
            .lines()
            .iter()
            .map(|line| line.text.clone())
            .collect();
        assert!(text.iter().any(|line| line == "[!] info:"));
        assert!(text
            .iter()
            .any(|line| line.contains("immediately terminates the program")));
    }

    #[test]
    fn bare_help_lists_base_commands_only() {
        let mut session = Session::new("um");
        session.dispatch_submitted("help");
        let text: Vec<String> = session
            .history
            .lines()
            .iter()
            .map(|line| line.text.clone())
            .collect();
        assert!(text.iter().any(|line| line == "- exit"));
        assert!(text.iter().any(|line| line == "- build wine existing"));
        assert!(!text.iter().any(|line| line.starts_with("- help")));
    }

    #[test]
    fn prefix_change_invalidates_the_runtime() {
        let mut session = Session::new("um");
        session.set_runtime("/rt/".to_string(), "runtime-2.3".to_string(), 1);
        assert!(session.has_runtime());

        session.set_prefix("/home/um/prefixes/games".to_string());
        assert!(!session.has_runtime());
        assert_eq!(session.prefix_path, "/home/um/prefixes/games");
    }

    #[test]
    fn project_change_resets_config() {
        let mut session = Session::new("um");
        session.set_config("Default -> Demo", 1);
        assert_eq!(session.config_name, "Demo");

        assert!(session.set_project("/home/um/dev/game/game.yyp".to_string()));
        assert_eq!(session.config_name, "Default");
        assert_eq!(session.config_index, 0);
    }

    #[test]
    fn snapshot_round_trip_preserves_selections() {
        let mut session = Session::new("um");
        session.set_project("/home/um/dev/game/game.yyp".to_string());
        session.set_runtime("/rt/".to_string(), "runtime-2.3".to_string(), 2);
        session.set_drive(3);
        session.set_debug(true);
        session.variant_suffix = "-LTS".to_string();

        let snapshot = session.snapshot();
        let mut restored = Session::new("um");
        assert!(restored.apply_snapshot(&snapshot));

        assert_eq!(restored.project_name, "game");
        assert_eq!(restored.project_dir, "/home/um/dev/game/");
        assert_eq!(restored.runtime_name, "runtime-2.3");
        assert_eq!(restored.drive_letter, 'D');
        assert!(restored.debug_enabled);
        assert_eq!(restored.variant_suffix, "-LTS");
        assert!(restored.restored_from_snapshot);
    }

    #[test]
    fn snapshot_with_bad_project_path_restores_nothing() {
        let mut session = Session::new("um");
        let mut snapshot = session.snapshot();
        snapshot.project_path = "/home/um/not_a_project".to_string();
        assert!(!session.apply_snapshot(&snapshot));
        assert!(!session.restored_from_snapshot);
    }

    #[test]
    fn drive_selection_maps_index_to_letter() {
        let mut session = Session::new("um");
        session.set_drive(25);
        assert_eq!(session.drive_letter, 'Z');
        session.set_drive(0);
        assert_eq!(session.drive_letter, 'A');
    }
}
