//! Fullscreen TUI engine for interactive build shells.
//!
//! Invariant: single output gate — only `core::output::OutputGate::flush(..)`
//! writes to the terminal.
//!
//! # Public API Overview
//! - Drive a cooperative session loop via [`EventLoop`]: bounded-timeout
//!   event polling, diffed fullscreen drawing, teardown on every exit path.
//! - Parse/inspect input with key and event helpers.
//! - Compose screens from the prompt, selection-list, and log-view widgets.
//! - Supervise external processes with [`ProcessSupervisor`]; every spawned
//!   reader and process is terminated before the session ends.

pub mod config;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Session history types.
pub use crate::core::history::{HistoryBuffer, InputHistory, OutputLine, URGENT_PREFIX};

/// Prefix autocomplete primitives.
pub use crate::core::matcher::{CommandVocabulary, PrefixMatch};

/// Keybinding configuration and default mappings.
pub use crate::core::keybindings::{
    default_session_keybindings_handle, get_session_keybindings, KeyId, SessionAction,
    SessionKeybindingsConfig, SessionKeybindingsHandle, SessionKeybindingsManager,
    DEFAULT_SESSION_KEYBINDINGS,
};

/// Keyboard input parsing and matching helpers.
pub use crate::core::input::{matches_key, parse_key, parse_text};
pub use crate::core::input_event::{parse_input_events, InputEvent};

/// Terminal interfaces and process-backed implementation.
pub use crate::core::terminal::Terminal;
pub use crate::platform::ProcessTerminal;

/// Background stream readers and process supervision.
pub use crate::platform::{HandleState, ProcessHandle, ProcessSupervisor, StreamReader};

/// Render-layer types.
pub use crate::render::{CursorPos, DiffRenderer, Frame};

/// Session loop plumbing.
pub use crate::runtime::{lock_unpoisoned, EventLoop, SessionEvent, SessionWake};

/// Built-in UI components.
pub use crate::widgets::{Prompt, PromptReaction, SelectList, SelectReaction};

/// ANSI-aware width helpers.
pub use crate::core::text::{truncate_to_width, visible_width};
