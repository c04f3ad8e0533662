//! Scrollable single-selection list.
//!
//! Invariant, whenever items is non-empty and the viewport has room:
//! `scroll <= index < scroll + viewport` and `0 <= index < items.len()`.
//! Up/Down wrap circularly at both ends.

use crate::core::input_event::InputEvent;
use crate::core::keybindings::{SessionAction, SessionKeybindingsHandle};
use crate::core::text::truncate_to_width;
use crate::render::style;

/// Smallest viewport the list will render into; anything narrower or
/// shorter gets the degraded "window too small" banner instead.
pub const MIN_USABLE_WIDTH: usize = 24;
pub const MIN_USABLE_ROWS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectReaction {
    None,
    Moved,
    Confirmed(usize),
    Cancelled,
}

pub struct SelectList {
    items: Vec<String>,
    index: usize,
    scroll: usize,
    keybindings: SessionKeybindingsHandle,
}

impl SelectList {
    /// An out-of-range `initial_index` falls back to zero rather than
    /// failing.
    pub fn new(
        items: Vec<String>,
        initial_index: usize,
        keybindings: SessionKeybindingsHandle,
    ) -> Self {
        let index = if initial_index < items.len() {
            initial_index
        } else {
            0
        };
        Self {
            items,
            index,
            scroll: 0,
            keybindings,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the viewport is large enough to render items at all.
    pub fn fits(width: usize, rows: usize) -> bool {
        width >= MIN_USABLE_WIDTH && rows >= MIN_USABLE_ROWS
    }

    /// Restore the scroll invariant for the given viewport height; called
    /// before rendering and after resizes.
    pub fn normalize(&mut self, viewport_rows: usize) {
        if self.items.is_empty() || viewport_rows == 0 {
            self.scroll = 0;
            return;
        }
        if self.index >= self.items.len() {
            self.index = self.items.len() - 1;
        }
        if self.index < self.scroll {
            self.scroll = self.index;
        }
        if self.index >= self.scroll + viewport_rows {
            self.scroll = self.index + 1 - viewport_rows;
        }
        let max_scroll = self.items.len().saturating_sub(viewport_rows);
        if self.scroll > max_scroll {
            self.scroll = max_scroll;
        }
    }

    fn move_up(&mut self, viewport_rows: usize) {
        if self.items.is_empty() {
            return;
        }
        if self.index == 0 {
            self.index = self.items.len() - 1;
            self.scroll = self.items.len().saturating_sub(viewport_rows.max(1));
        } else {
            self.index -= 1;
            if self.index < self.scroll {
                self.scroll = self.index;
            }
        }
        self.normalize(viewport_rows.max(1));
    }

    fn move_down(&mut self, viewport_rows: usize) {
        if self.items.is_empty() {
            return;
        }
        if self.index == self.items.len() - 1 {
            self.index = 0;
            self.scroll = 0;
        } else {
            self.index += 1;
        }
        self.normalize(viewport_rows.max(1));
    }

    /// Handle one event against the current viewport height.
    pub fn handle_event(&mut self, event: &InputEvent, viewport_rows: usize) -> SelectReaction {
        let raw = match event {
            InputEvent::Key { raw, .. } => raw.as_str(),
            InputEvent::Text { raw, .. } => raw.as_str(),
            _ => return SelectReaction::None,
        };

        enum Action {
            Up,
            Down,
            Confirm,
            Cancel,
        }

        let action = {
            let kb = match self.keybindings.lock() {
                Ok(kb) => kb,
                Err(poisoned) => poisoned.into_inner(),
            };
            if kb.matches(raw, SessionAction::SelectUp) {
                Some(Action::Up)
            } else if kb.matches(raw, SessionAction::SelectDown) {
                Some(Action::Down)
            } else if kb.matches(raw, SessionAction::SelectConfirm) {
                Some(Action::Confirm)
            } else if kb.matches(raw, SessionAction::Interrupt) {
                Some(Action::Cancel)
            } else {
                None
            }
        };

        match action {
            Some(Action::Up) => {
                self.move_up(viewport_rows);
                SelectReaction::Moved
            }
            Some(Action::Down) => {
                self.move_down(viewport_rows);
                SelectReaction::Moved
            }
            Some(Action::Confirm) => {
                if self.items.is_empty() {
                    SelectReaction::None
                } else {
                    SelectReaction::Confirmed(self.index)
                }
            }
            Some(Action::Cancel) => SelectReaction::Cancelled,
            None => SelectReaction::None,
        }
    }

    /// Render the visible window, one row per line.
    pub fn render(&mut self, width: usize, viewport_rows: usize) -> Vec<String> {
        self.normalize(viewport_rows);
        let mut rows = Vec::new();
        if viewport_rows == 0 {
            return rows;
        }
        if self.items.is_empty() {
            rows.push(style::accent("  (nothing found)"));
            return rows;
        }

        let end = (self.scroll + viewport_rows).min(self.items.len());
        for idx in self.scroll..end {
            let item = &self.items[idx];
            let line = if idx == self.index {
                let text = truncate_to_width(&format!("→ {item}"), width.saturating_sub(2), true);
                format!("  {}", style::selected(&text))
            } else {
                let text = truncate_to_width(item, width.saturating_sub(4), false);
                format!("    {text}")
            };
            rows.push(line);
        }
        rows
    }
}
