//! The interactive session: prompt shell, selection screens, live build.
//!
//! Screen flow: init runs the three selection screens (or restores a
//! snapshot and skips them), then the prompt shell loops until exit. A
//! build command enters the live-build screen, which always tears down its
//! process supervisor before returning to the shell.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use autoload_store::{default_snapshot_path, save_snapshot, AutoloadSnapshot};
use kiln_tui::widgets::log_view;
use kiln_tui::{
    get_session_keybindings, lock_unpoisoned, CommandVocabulary, CursorPos, EventLoop, Frame,
    HandleState, InputEvent, ProcessSupervisor, Prompt, PromptReaction, SelectList,
    SelectReaction, SessionAction, SessionEvent, SessionWake, Terminal,
};

use kiln_tui::render::style;

use crate::app::{Action, Session, DRIVE_LETTERS};
use crate::buildcfg::{self, BuildDocuments, BuildSource};
use crate::discovery;
use crate::wine;

const APP_TITLE: &str = "  gmbuild-cli";
const MIN_USABLE_WIDTH: usize = 24;
const MIN_USABLE_ROWS: u16 = 3;

/// Redraw batching window for the live-build screen; reader output is
/// coalesced across it so a chatty compiler cannot force a redraw per line.
const BATCH_WINDOW: Duration = Duration::from_millis(100);

pub struct SessionUi<T: Terminal> {
    events: EventLoop<T>,
    prompt: Prompt,
    vocabulary: CommandVocabulary,
    session: Session,
    documents: Option<BuildDocuments>,
}

impl<T: Terminal> SessionUi<T> {
    pub fn new(terminal: T, session: Session) -> Self {
        Self {
            events: EventLoop::new(terminal),
            prompt: Prompt::new(get_session_keybindings()),
            vocabulary: crate::commands::vocabulary(),
            session,
            documents: None,
        }
    }

    /// Wake handle for external stop requests (signal cleanup).
    pub fn wake_handle(&self) -> Arc<SessionWake> {
        self.events.wake_handle()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Consume the UI and hand back the session state (used after `run`
    /// returns to inspect or persist final state).
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Run the whole session; returns once the user exits.
    pub fn run(&mut self, snapshot: Option<AutoloadSnapshot>) -> std::io::Result<()> {
        self.events.start()?;
        self.draw_splash();
        self.init_selections(snapshot);
        self.prompt_shell();
        self.events.stop()
    }

    fn draw_splash(&mut self) {
        let (width, rows) = self.viewport();
        let mut frame = Frame::blank(rows as usize);
        frame.set_row(0, self.title_row(width, None));
        frame.set_row(1, "Please wait...".to_string());
        self.events.draw(&frame);
    }

    fn viewport(&self) -> (usize, u16) {
        let (columns, rows) = self.events.size();
        (columns as usize, rows)
    }

    fn is_too_small(width: usize, rows: u16) -> bool {
        width < MIN_USABLE_WIDTH || rows < MIN_USABLE_ROWS
    }

    fn title_row(&self, width: usize, screen: Option<&str>) -> String {
        let text = match screen {
            Some(screen) => format!("{APP_TITLE} | {screen}"),
            None => APP_TITLE.to_string(),
        };
        let padded = kiln_tui::truncate_to_width(&text, width, true);
        style::title_bar(&padded)
    }

    fn too_small_row(&self, width: usize) -> String {
        let text = if width > 17 { "window too small" } else { "error" };
        let padded = kiln_tui::truncate_to_width(text, width, true);
        style::title_bar(&padded)
    }

    // --- Init ------------------------------------------------------------

    fn init_selections(&mut self, snapshot: Option<AutoloadSnapshot>) {
        let restored = snapshot
            .map(|snapshot| self.session.apply_snapshot(&snapshot))
            .unwrap_or(false);

        if restored {
            let prefix = self.session.prefix_path.clone();
            self.session.note(format!("WINE prefix set to {prefix}"));
            self.scan_user_dir();
            self.scan_gm_install();
            let runtime = self.session.runtime_name.clone();
            self.session
                .note(format!("GameMaker runtime set to {runtime}"));
            let project = self.session.project_name.clone();
            self.session.note(format!("project set to {project}"));
        } else {
            let home = self.session.home_dir();
            let prefixes = discovery::find_prefixes(Path::new(&home));
            if prefixes.is_empty() {
                self.session.advisory("no wine prefixes found!");
            } else if let Some(index) = self.selection_screen("set wine prefix", &prefixes, 0) {
                self.session.set_prefix(prefixes[index].clone());
                self.scan_user_dir();
            }
            if self.session.should_exit {
                return;
            }

            self.scan_gm_install();

            match discovery::find_runtimes(Path::new(&self.session.prefix_path)) {
                Some((root, names)) => {
                    if let Some(index) = self.selection_screen("set runtime", &names, 0) {
                        self.session.set_runtime(root, names[index].clone(), index);
                    }
                }
                None => {
                    self.session
                        .advisory("no runtimes found, are they installed?");
                }
            }
            if self.session.should_exit {
                return;
            }

            let projects = discovery::find_projects(Path::new(&home));
            if projects.is_empty() {
                self.session.advisory("no GameMaker projects found!");
            } else if let Some(index) =
                self.selection_screen("set gamemaker project", &projects, 0)
            {
                self.session.set_project(projects[index].clone());
            }
        }

        let config = self.session.config_name.clone();
        self.session.note(format!("config set to {config}"));
        if restored {
            self.session.note(
                "finished performing autoload, to prevent this in the future delete ~/.gmbuild_autoload",
            );
        }
    }

    fn scan_user_dir(&mut self) {
        match discovery::find_user_dir(Path::new(&self.session.prefix_path)) {
            Some(user_dir) => {
                self.session
                    .note(format!("found GameMaker user data in {user_dir}"));
                self.session.user_dir = user_dir;
            }
            None => {
                self.session
                    .advisory("failed to locate GameMaker user login data!");
                self.session.user_dir.clear();
            }
        }
    }

    fn scan_gm_install(&mut self) {
        match discovery::find_gm_executable(Path::new(&self.session.prefix_path)) {
            Some(install) => {
                self.session
                    .note(format!("GameMaker executable located at {}", install.exe_path));
                self.session.gm_exe_path = install.exe_path;
                self.session.variant_suffix = install.variant_suffix;
            }
            None => {
                self.session.advisory("GameMaker executable not found!");
                self.session.gm_exe_path.clear();
            }
        }
    }

    // --- Selection screen -------------------------------------------------

    fn list_viewport_rows(&self) -> usize {
        let (_, rows) = self.viewport();
        (rows.saturating_sub(1) as usize).max(1)
    }

    /// Modal selection: returns the confirmed index, or `None` when the
    /// session is asked to stop mid-selection.
    fn selection_screen(&mut self, title: &str, items: &[String], initial: usize) -> Option<usize> {
        let mut list = SelectList::new(items.to_vec(), initial, get_session_keybindings());

        loop {
            if self.session.should_exit {
                return None;
            }
            self.draw_selection(title, &mut list);

            let viewport = self.list_viewport_rows();
            match self.events.poll_event(None) {
                SessionEvent::Stopped => {
                    self.session.should_exit = true;
                    return None;
                }
                SessionEvent::TimedOut => continue,
                SessionEvent::Input(InputEvent::Resize { .. }) => continue,
                SessionEvent::Input(event) => match list.handle_event(&event, viewport) {
                    SelectReaction::Confirmed(index) => return Some(index),
                    SelectReaction::Cancelled => {
                        self.session.should_exit = true;
                        return None;
                    }
                    _ => continue,
                },
            }
        }
    }

    fn draw_selection(&mut self, title: &str, list: &mut SelectList) {
        let (width, rows) = self.viewport();
        let mut frame = Frame::blank(rows as usize);
        if Self::is_too_small(width, rows) {
            frame.set_row(0, self.too_small_row(width));
            self.events.draw(&frame);
            return;
        }

        frame.set_row(0, self.title_row(width, Some(title)));
        let viewport = (rows.saturating_sub(1) as usize).max(1);
        for (offset, row) in list.render(width, viewport).into_iter().enumerate() {
            frame.set_row(1 + offset, row);
        }
        self.events.draw(&frame);
    }

    // --- Prompt shell ------------------------------------------------------

    fn prompt_shell(&mut self) {
        loop {
            if self.session.should_exit {
                break;
            }
            self.draw_prompt_shell();

            match self.events.poll_event(None) {
                SessionEvent::Stopped => break,
                SessionEvent::TimedOut => {}
                SessionEvent::Input(InputEvent::Resize { .. }) => {}
                SessionEvent::Input(event) => match self.prompt.handle_event(&event) {
                    PromptReaction::None | PromptReaction::Edited => {}
                    PromptReaction::Interrupt => {
                        self.session.should_exit = true;
                    }
                    PromptReaction::HistoryPrevious => {
                        if let Some(previous) =
                            self.session.input_history.previous(self.prompt.value())
                        {
                            self.prompt.set_value_end(previous);
                        }
                    }
                    PromptReaction::HistoryNext => {
                        if let Some(next) = self.session.input_history.next() {
                            self.prompt.set_value_end(next);
                        }
                    }
                    PromptReaction::AcceptHint => {
                        let completed = self
                            .vocabulary
                            .best_match(self.prompt.value())
                            .and_then(|matched| self.vocabulary.entry(matched.index))
                            .map(str::to_string);
                        if let Some(completed) = completed {
                            self.prompt.set_value_end(completed);
                        }
                    }
                    PromptReaction::Submit(line) => {
                        self.prompt.clear();
                        let action = self.session.dispatch_submitted(&line);
                        self.perform(action);
                    }
                },
            }
        }
    }

    fn draw_prompt_shell(&mut self) {
        let (width, rows) = self.viewport();
        let mut frame = Frame::blank(rows as usize);
        if Self::is_too_small(width, rows) {
            frame.set_row(0, self.too_small_row(width));
            self.events.draw(&frame);
            return;
        }

        frame.set_row(0, self.title_row(width, None));

        let history_rows = rows.saturating_sub(2) as usize;
        let window = log_view::render_window(&self.session.history, width, history_rows);
        for (offset, row) in window.into_iter().enumerate() {
            frame.set_row(1 + offset, row);
        }

        let hint = self.vocabulary.hint(self.prompt.value());
        let (prompt_row, cursor_col) = self.prompt.render(width, &hint);
        let prompt_row_index = rows.saturating_sub(1) as usize;
        frame.set_row(prompt_row_index, prompt_row);

        let frame = frame.with_cursor(Some(CursorPos {
            row: rows.saturating_sub(1),
            col: cursor_col,
        }));
        self.events.draw(&frame);
    }

    // --- Command actions ---------------------------------------------------

    fn perform(&mut self, action: Action) {
        match action {
            Action::None | Action::Exit => {}
            Action::PrintRuntimes => self.print_runtimes(),
            Action::OpenRuntimeSelect => self.open_runtime_select(),
            Action::OpenConfigSelect => self.open_config_select(),
            Action::OpenDebugSelect => self.open_debug_select(),
            Action::OpenDriveSelect => self.open_drive_select(),
            Action::OpenPrefixSelect => self.open_prefix_select(),
            Action::OpenProjectSelect => self.open_project_select(),
            Action::CleanBuild => self.clean_build(),
            Action::KillServer => {
                wine::kill_wineserver();
                self.session.note("WINE server killed...");
            }
            Action::ExportAutoload => self.export_autoload(),
            Action::StartBuild { use_existing } => self.start_build(use_existing),
        }
    }

    fn print_runtimes(&mut self) {
        match discovery::find_runtimes(Path::new(&self.session.prefix_path)) {
            Some((_, names)) => {
                for name in names {
                    self.session.note(format!("\t{name}"));
                }
            }
            None => self.session.note("no runtimes found!"),
        }
    }

    fn open_runtime_select(&mut self) {
        match discovery::find_runtimes(Path::new(&self.session.prefix_path)) {
            Some((root, names)) => {
                let initial = self.session.runtime_index.unwrap_or(0);
                if let Some(index) = self.selection_screen("set runtime", &names, initial) {
                    self.session.set_runtime(root, names[index].clone(), index);
                }
            }
            None => self.session.advisory("no runtimes found!"),
        }
    }

    fn open_config_select(&mut self) {
        let configs = discovery::list_configs(Path::new(&self.session.project_path));
        if configs.is_empty() {
            self.session.advisory("no configs found!");
            return;
        }
        let initial = self.session.config_index;
        if let Some(index) = self.selection_screen("set config", &configs, initial) {
            self.session.set_config(&configs[index], index);
        }
    }

    fn open_debug_select(&mut self) {
        let items = vec!["disabled".to_string(), "enabled".to_string()];
        let initial = usize::from(self.session.debug_enabled);
        if let Some(index) = self.selection_screen("debug mode", &items, initial) {
            self.session.set_debug(index == 1);
        }
    }

    fn open_drive_select(&mut self) {
        let letters: Vec<String> = DRIVE_LETTERS.iter().map(char::to_string).collect();
        let initial = self.session.drive_index.unwrap_or(DRIVE_LETTERS.len() - 1);
        if let Some(index) = self.selection_screen("set wine drive letter", &letters, initial) {
            self.session.set_drive(index);
        }
    }

    fn open_prefix_select(&mut self) {
        let home = self.session.home_dir();
        let prefixes = discovery::find_prefixes(Path::new(&home));
        if prefixes.is_empty() {
            self.session.advisory("no wine prefixes found!");
            return;
        }
        if let Some(index) = self.selection_screen("set wine prefix", &prefixes, 0) {
            self.session.set_prefix(prefixes[index].clone());
            self.scan_user_dir();
            self.scan_gm_install();
            self.session.advisory("please select a valid runtime!");
        }
    }

    fn open_project_select(&mut self) {
        let home = self.session.home_dir();
        let projects = discovery::find_projects(Path::new(&home));
        if projects.is_empty() {
            self.session.advisory("no GameMaker projects found!");
            return;
        }
        if let Some(index) = self.selection_screen("set gamemaker project", &projects, 0) {
            self.session.set_project(projects[index].clone());
        }
    }

    fn clean_build(&mut self) {
        match wine::clean_build_tree(&self.session.prefix_path) {
            Ok(()) => self.session.note("build files removed"),
            Err(_) => self.session.advisory("failed to remove build files!"),
        }
    }

    fn export_autoload(&mut self) {
        let result = default_snapshot_path()
            .and_then(|path| save_snapshot(&path, self.session.snapshot()));
        match result {
            Ok(()) => self
                .session
                .note("autoload exported, to prevent autoload delete ~/.gmbuild_autoload"),
            Err(_) => self.session.note("failed to write autoload file"),
        }
    }

    // --- Live build --------------------------------------------------------

    fn start_build(&mut self, use_existing: bool) {
        let source = if use_existing {
            BuildSource::ExistingFile
        } else {
            BuildSource::Generated
        };

        if !use_existing {
            match buildcfg::write_build_documents(&self.session) {
                Ok(documents) => self.documents = Some(documents),
                Err(err) => {
                    self.session.advisory(err.to_string());
                    return;
                }
            }
        }

        let resolved =
            match buildcfg::resolve_build_source(source, &self.session, self.documents.as_ref()) {
                Ok(resolved) => resolved,
                Err(err) => {
                    self.session.advisory(err.to_string());
                    return;
                }
            };
        if use_existing {
            self.session
                .advisory(format!("runtime set to {}", resolved.runtime_name));
            self.session.runtime_name = resolved.runtime_name.clone();
        }

        let runtime_dir = self.session.runtime_dir();
        let Some(igor) = discovery::find_file_named(Path::new(&runtime_dir), "Igor.exe", None)
        else {
            self.session.advisory("failed to find Igor.exe!");
            return;
        };

        let command =
            wine::igor_command_line(&self.session.prefix_path, &igor, &resolved.options_path);
        self.live_build(&command);
    }

    fn live_build(&mut self, command: &str) {
        let compile_start = self.session.history.len();
        let mut supervisor = ProcessSupervisor::new(Some(wine::wineserver_kill_command(
            &self.session.prefix_path,
        )));

        if supervisor.spawn("igor", command) == HandleState::Dead {
            self.session.advisory("failed to start the build process!");
            supervisor.terminate_all();
            return;
        }

        let mut instance_count: usize = 1;
        loop {
            for line in supervisor.drain_available() {
                self.session.history.append(line);
            }
            self.draw_build_screen(instance_count);

            match self.events.poll_event(Some(BATCH_WINDOW)) {
                SessionEvent::Stopped => {
                    self.session.should_exit = true;
                    break;
                }
                SessionEvent::TimedOut => continue,
                SessionEvent::Input(InputEvent::Resize { .. }) => continue,
                SessionEvent::Input(event) => {
                    let raw = match &event {
                        InputEvent::Key { raw, .. } => raw.clone(),
                        InputEvent::Text { raw, .. } => raw.clone(),
                        _ => continue,
                    };

                    let (quit, interrupt, pause, dump, launch) = {
                        let kb = get_session_keybindings();
                        let kb = lock_unpoisoned(&kb);
                        (
                            kb.matches(&raw, SessionAction::BuildQuit),
                            kb.matches(&raw, SessionAction::Interrupt),
                            kb.matches(&raw, SessionAction::BuildPauseToggle),
                            kb.matches(&raw, SessionAction::BuildDump),
                            kb.matches(&raw, SessionAction::BuildLaunchInstance),
                        )
                    };

                    if quit {
                        self.session.note("killing WINE server...");
                        break;
                    }
                    if interrupt {
                        self.session.should_exit = true;
                        break;
                    }
                    if pause {
                        if self.session.history.is_paused() {
                            self.session.history.resume();
                            self.session.advisory("output resumed");
                        } else {
                            self.session
                                .advisory("output paused, WINE server running in the background...");
                            self.session.history.pause();
                        }
                    } else if dump {
                        self.dump_log(compile_start);
                    } else if launch {
                        self.launch_instance(&mut supervisor, &mut instance_count);
                    }
                }
            }
        }

        // Exiting this screen always kills everything first, then joins the
        // readers; the supervisor enforces that order.
        supervisor.terminate_all();
        self.session.history.resume();
        self.session.advisory("WINE server killed...");
    }

    fn dump_log(&mut self, compile_start: usize) {
        let end = self.session.history.view_index();
        let body: Vec<&str> = self
            .session
            .history
            .slice(compile_start, end)
            .iter()
            .map(|line| line.text.as_str())
            .collect();
        let path = format!("{}/dump.log", self.session.home_dir());
        match std::fs::write(&path, body.join("\n")) {
            Ok(()) => self.session.advisory("dumped output to ~/dump.log"),
            Err(_) => self.session.advisory("failed to dump log!"),
        }
    }

    fn launch_instance(&mut self, supervisor: &mut ProcessSupervisor, instance_count: &mut usize) {
        let Some(game_file) = self
            .documents
            .as_ref()
            .map(|documents| documents.options.compile_output_file_name.clone())
        else {
            self.session.advisory("failed to launch new instance!");
            return;
        };

        let runtime_dir = self.session.runtime_dir();
        let Some(runner) = discovery::find_file_named(Path::new(&runtime_dir), "Runner.exe", None)
        else {
            self.session.advisory("failed to launch new instance!");
            return;
        };

        let command =
            wine::runner_command_line(&self.session.prefix_path, &runner, &game_file);
        *instance_count += 1;
        let label = format!("runner-{instance_count}");
        if supervisor.launch_secondary(&label, &command) == HandleState::Dead {
            *instance_count -= 1;
            self.session.advisory("failed to launch new instance!");
        } else {
            self.session
                .advisory(format!("launched game instance {instance_count}"));
        }
    }

    fn key_label(&self, action: SessionAction) -> String {
        let kb = get_session_keybindings();
        let kb = lock_unpoisoned(&kb);
        kb.get_keys(action)
            .first()
            .map(|key| key.to_uppercase())
            .unwrap_or_default()
    }

    fn draw_build_screen(&mut self, instance_count: usize) {
        let (width, rows) = self.viewport();
        let mut frame = Frame::blank(rows as usize);
        if Self::is_too_small(width, rows) {
            frame.set_row(0, self.too_small_row(width));
            self.events.draw(&frame);
            return;
        }

        frame.set_row(0, self.title_row(width, Some("running program...")));

        let history_rows = rows.saturating_sub(3) as usize;
        let window = log_view::render_window(&self.session.history, width, history_rows);
        for (offset, row) in window.into_iter().enumerate() {
            frame.set_row(1 + offset, row);
        }

        let pause_label = if self.session.history.is_paused() {
            "resume output"
        } else {
            "pause output"
        };
        let hint1 = format!(
            "  [{}] kill wineserver | [{}] {pause_label}",
            self.key_label(SessionAction::BuildQuit),
            self.key_label(SessionAction::BuildPauseToggle),
        );
        let hint2 = format!(
            "  [{}] dump output     | [{}] launch instance {}",
            self.key_label(SessionAction::BuildDump),
            self.key_label(SessionAction::BuildLaunchInstance),
            instance_count + 1,
        );

        let hint1 = style::title_bar(&kiln_tui::truncate_to_width(&hint1, width, true));
        let hint2 = style::title_bar(&kiln_tui::truncate_to_width(&hint2, width, true));
        frame.set_row(rows.saturating_sub(2) as usize, hint1);
        frame.set_row(rows.saturating_sub(1) as usize, hint2);

        self.events.draw(&frame);
    }
}
