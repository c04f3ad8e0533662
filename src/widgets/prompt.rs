//! Single-line command prompt with a ghost autocomplete hint.

use crate::core::input_event::InputEvent;
use crate::core::keybindings::{SessionAction, SessionKeybindingsHandle};
use crate::core::text::{grapheme_segments, visible_width};
use crate::render::style;

/// What the session loop should do in response to a key the prompt saw.
///
/// Editing keys mutate the prompt in place and report `Edited`; keys that
/// need session context (history, vocabulary, dispatch) are surfaced to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptReaction {
    None,
    Edited,
    Submit(String),
    HistoryPrevious,
    HistoryNext,
    AcceptHint,
    Interrupt,
}

pub struct Prompt {
    value: String,
    cursor: usize,
    prefix: String,
    keybindings: SessionKeybindingsHandle,
}

impl Prompt {
    pub fn new(keybindings: SessionKeybindingsHandle) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            prefix: "> ".to_string(),
            keybindings,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Replace the text and put the cursor at the end (history replay and
    /// hint acceptance both land here).
    pub fn set_value_end(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.len();
    }

    fn clamp_cursor(&mut self) {
        if self.cursor > self.value.len() {
            self.cursor = self.value.len();
        }
        while self.cursor > 0 && !self.value.is_char_boundary(self.cursor) {
            self.cursor -= 1;
        }
    }

    fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let cleaned: String = text.chars().filter(|ch| !ch.is_control()).collect();
        if cleaned.is_empty() {
            return;
        }
        let mut next = String::with_capacity(self.value.len() + cleaned.len());
        next.push_str(&self.value[..self.cursor]);
        next.push_str(&cleaned);
        next.push_str(&self.value[self.cursor..]);
        self.value = next;
        self.cursor += cleaned.len();
    }

    fn delete_backward(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let before_cursor = &self.value[..self.cursor];
        let grapheme_len = grapheme_segments(before_cursor)
            .next_back()
            .map(str::len)
            .unwrap_or(1);
        let start = self.cursor.saturating_sub(grapheme_len);
        self.value.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let before_cursor = &self.value[..self.cursor];
        let grapheme_len = grapheme_segments(before_cursor)
            .next_back()
            .map(str::len)
            .unwrap_or(1);
        self.cursor = self.cursor.saturating_sub(grapheme_len);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        let after_cursor = &self.value[self.cursor..];
        let grapheme_len = grapheme_segments(after_cursor)
            .next()
            .map(str::len)
            .unwrap_or(1);
        self.cursor = (self.cursor + grapheme_len).min(self.value.len());
    }

    /// Translate one input event into an edit or a session-level reaction.
    pub fn handle_event(&mut self, event: &InputEvent) -> PromptReaction {
        self.clamp_cursor();

        let raw = match event {
            InputEvent::Text { text, .. } => {
                self.insert_text(text);
                return PromptReaction::Edited;
            }
            InputEvent::Paste { text, .. } => {
                let single_line = text.replace(['\r', '\n'], "");
                self.insert_text(&single_line);
                return PromptReaction::Edited;
            }
            InputEvent::Key { raw, .. } => raw.as_str(),
            _ => return PromptReaction::None,
        };

        enum Action {
            Left,
            RightOrHint,
            LineStart,
            LineEnd,
            DeleteBackward,
            ClearLine,
            HistoryPrevious,
            HistoryNext,
            AcceptHint,
            Submit,
            Interrupt,
        }

        let action = {
            let kb = match self.keybindings.lock() {
                Ok(kb) => kb,
                Err(poisoned) => poisoned.into_inner(),
            };
            if kb.matches(raw, SessionAction::Submit) {
                Some(Action::Submit)
            } else if kb.matches(raw, SessionAction::Interrupt) {
                Some(Action::Interrupt)
            } else if kb.matches(raw, SessionAction::AcceptHint) {
                Some(Action::AcceptHint)
            } else if kb.matches(raw, SessionAction::DeleteCharBackward) {
                Some(Action::DeleteBackward)
            } else if kb.matches(raw, SessionAction::ClearLine) {
                Some(Action::ClearLine)
            } else if kb.matches(raw, SessionAction::CursorLeft) {
                Some(Action::Left)
            } else if kb.matches(raw, SessionAction::CursorRight) {
                Some(Action::RightOrHint)
            } else if kb.matches(raw, SessionAction::CursorLineStart) {
                Some(Action::LineStart)
            } else if kb.matches(raw, SessionAction::CursorLineEnd) {
                Some(Action::LineEnd)
            } else if kb.matches(raw, SessionAction::HistoryPrevious) {
                Some(Action::HistoryPrevious)
            } else if kb.matches(raw, SessionAction::HistoryNext) {
                Some(Action::HistoryNext)
            } else {
                None
            }
        };

        match action {
            Some(Action::Submit) => PromptReaction::Submit(self.value.clone()),
            Some(Action::Interrupt) => PromptReaction::Interrupt,
            Some(Action::AcceptHint) => PromptReaction::AcceptHint,
            Some(Action::DeleteBackward) => {
                self.delete_backward();
                PromptReaction::Edited
            }
            Some(Action::ClearLine) => {
                self.clear();
                PromptReaction::Edited
            }
            Some(Action::Left) => {
                self.move_left();
                PromptReaction::Edited
            }
            Some(Action::RightOrHint) => {
                // Right arrow at end-of-text accepts the hint, like tab.
                if self.cursor >= self.value.len() {
                    PromptReaction::AcceptHint
                } else {
                    self.move_right();
                    PromptReaction::Edited
                }
            }
            Some(Action::LineStart) => {
                self.cursor = 0;
                PromptReaction::Edited
            }
            Some(Action::LineEnd) => {
                self.cursor = self.value.len();
                PromptReaction::Edited
            }
            Some(Action::HistoryPrevious) => PromptReaction::HistoryPrevious,
            Some(Action::HistoryNext) => PromptReaction::HistoryNext,
            None => PromptReaction::None,
        }
    }

    /// Render the prompt row with the ghost hint and report the hardware
    /// cursor column. The row is clipped to `width` by the renderer; the
    /// window scrolls so the cursor stays visible on long input.
    pub fn render(&self, width: usize, hint: &str) -> (String, u16) {
        let prefix_width = visible_width(&self.prefix);
        let available = width.saturating_sub(prefix_width);

        let value_width = visible_width(&self.value);
        let (visible_value, cursor_offset_width) = if value_width < available {
            (
                self.value.clone(),
                visible_width(&self.value[..self.cursor]),
            )
        } else {
            // Scroll: keep the cursor inside the window, anchored at the
            // right edge while typing at the end.
            let target = available.saturating_sub(1).max(1);
            let mut start = self.cursor;
            let mut window_width = 0;
            for grapheme in grapheme_segments(&self.value[..self.cursor]).rev() {
                let gw = visible_width(grapheme);
                if window_width + gw > target {
                    break;
                }
                window_width += gw;
                start -= grapheme.len();
            }
            let mut window = self.value[start..self.cursor].to_string();
            let mut width_after = window_width;
            for grapheme in grapheme_segments(&self.value[self.cursor..]) {
                let gw = visible_width(grapheme);
                if width_after + gw > target {
                    break;
                }
                width_after += gw;
                window.push_str(grapheme);
            }
            (window, window_width)
        };

        let mut row = String::with_capacity(width);
        row.push_str(&self.prefix);
        row.push_str(&visible_value);
        if !hint.is_empty() && self.cursor == self.value.len() && value_width < available {
            let hint_room = available.saturating_sub(value_width);
            if hint_room > 0 {
                let clipped = crate::core::text::truncate_to_width(hint, hint_room, false);
                row.push_str(&style::hint(&clipped));
            }
        }

        let cursor_col = (prefix_width + cursor_offset_width).min(width.saturating_sub(1)) as u16;
        (row, cursor_col)
    }
}

#[cfg(test)]
mod tests {
    use super::{Prompt, PromptReaction};
    use crate::core::input_event::parse_input_events;
    use crate::core::keybindings::default_session_keybindings_handle;

    fn send(prompt: &mut Prompt, data: &str) -> Vec<PromptReaction> {
        parse_input_events(data)
            .iter()
            .map(|event| prompt.handle_event(event))
            .collect()
    }

    #[test]
    fn edits_and_moves_cursor() {
        let mut prompt = Prompt::new(default_session_keybindings_handle());
        send(&mut prompt, "hello");
        assert_eq!(prompt.value(), "hello");
        assert_eq!(prompt.cursor(), 5);

        send(&mut prompt, "\x1b[D");
        send(&mut prompt, "\x1b[D");
        assert_eq!(prompt.cursor(), 3);

        send(&mut prompt, "p");
        assert_eq!(prompt.value(), "helplo");
        assert_eq!(prompt.cursor(), 4);

        send(&mut prompt, "\x7f");
        assert_eq!(prompt.value(), "hello");
        assert_eq!(prompt.cursor(), 3);
    }

    #[test]
    fn backspace_at_start_is_a_noop() {
        let mut prompt = Prompt::new(default_session_keybindings_handle());
        send(&mut prompt, "ab");
        send(&mut prompt, "\x1b[H");
        assert_eq!(prompt.cursor(), 0);
        send(&mut prompt, "\x7f");
        assert_eq!(prompt.value(), "ab");
    }

    #[test]
    fn home_end_and_clear_line() {
        let mut prompt = Prompt::new(default_session_keybindings_handle());
        send(&mut prompt, "build wine");
        send(&mut prompt, "\x1b[H");
        assert_eq!(prompt.cursor(), 0);
        send(&mut prompt, "\x1b[F");
        assert_eq!(prompt.cursor(), prompt.value().len());
        send(&mut prompt, "\x15");
        assert_eq!(prompt.value(), "");
        assert_eq!(prompt.cursor(), 0);
    }

    #[test]
    fn right_at_end_requests_hint_acceptance() {
        let mut prompt = Prompt::new(default_session_keybindings_handle());
        send(&mut prompt, "ex");
        let reactions = send(&mut prompt, "\x1b[C");
        assert_eq!(reactions, vec![PromptReaction::AcceptHint]);

        // In the middle it is plain cursor movement.
        send(&mut prompt, "\x1b[D");
        let reactions = send(&mut prompt, "\x1b[C");
        assert_eq!(reactions, vec![PromptReaction::Edited]);
    }

    #[test]
    fn tab_requests_hint_and_enter_submits() {
        let mut prompt = Prompt::new(default_session_keybindings_handle());
        send(&mut prompt, "exp");
        assert_eq!(send(&mut prompt, "\t"), vec![PromptReaction::AcceptHint]);
        assert_eq!(
            send(&mut prompt, "\r"),
            vec![PromptReaction::Submit("exp".to_string())]
        );
    }

    #[test]
    fn up_down_are_history_reactions() {
        let mut prompt = Prompt::new(default_session_keybindings_handle());
        assert_eq!(
            send(&mut prompt, "\x1b[A"),
            vec![PromptReaction::HistoryPrevious]
        );
        assert_eq!(
            send(&mut prompt, "\x1b[B"),
            vec![PromptReaction::HistoryNext]
        );
    }

    #[test]
    fn paste_is_flattened_to_one_line() {
        let mut prompt = Prompt::new(default_session_keybindings_handle());
        send(&mut prompt, "\x1b[200~set\ndebug\x1b[201~");
        assert_eq!(prompt.value(), "setdebug");
    }

    #[test]
    fn render_places_cursor_after_prefix() {
        let mut prompt = Prompt::new(default_session_keybindings_handle());
        send(&mut prompt, "abc");
        let (row, cursor_col) = prompt.render(40, "");
        assert!(row.starts_with("> abc"));
        assert_eq!(cursor_col, 5);
    }

    #[test]
    fn render_appends_hint_at_end_of_text() {
        let mut prompt = Prompt::new(default_session_keybindings_handle());
        send(&mut prompt, "exp");
        let (row, _) = prompt.render(40, "ort autoload");
        assert!(row.contains("ort autoload"));
    }

    #[test]
    fn long_input_keeps_cursor_in_window() {
        let mut prompt = Prompt::new(default_session_keybindings_handle());
        let long = "x".repeat(100);
        send(&mut prompt, &long);
        let (row, cursor_col) = prompt.render(20, "");
        assert!(crate::core::text::visible_width(&row) <= 20);
        assert!(cursor_col < 20);
    }
}
