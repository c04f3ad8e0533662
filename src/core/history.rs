//! Session history: the output log and the prompt replay history.

/// One recorded log line with a monotonically increasing sequence number
/// assigned at append time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub seq: u64,
    pub text: String,
}

/// Prefix that marks a line as urgent for the render layer.
pub const URGENT_PREFIX: &str = "[!]";

impl OutputLine {
    pub fn is_urgent(&self) -> bool {
        self.text.trim_start().starts_with(URGENT_PREFIX)
    }
}

/// Append-only ordered log with a logical view cursor.
///
/// Pausing freezes the *view* at the current length while appends continue
/// underneath; it never drops or reorders lines.
#[derive(Debug, Default)]
pub struct HistoryBuffer {
    lines: Vec<OutputLine>,
    next_seq: u64,
    paused_at: Option<usize>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line, returning its sequence number.
    pub fn append(&mut self, text: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.lines.push(OutputLine {
            seq,
            text: text.into(),
        });
        seq
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index one past the last line the view should show: the pause point
    /// while paused, the buffer length otherwise.
    pub fn view_index(&self) -> usize {
        self.paused_at.unwrap_or(self.lines.len())
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Pin the view at the current length. No-op while already paused.
    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(self.lines.len());
        }
    }

    /// Let the view track the tail again.
    pub fn resume(&mut self) {
        self.paused_at = None;
    }

    pub fn line(&self, index: usize) -> Option<&OutputLine> {
        self.lines.get(index)
    }

    /// Lines in `[from, to)`, clamped to the buffer bounds.
    pub fn slice(&self, from: usize, to: usize) -> &[OutputLine] {
        let to = to.min(self.lines.len());
        let from = from.min(to);
        &self.lines[from..to]
    }

    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }
}

/// Previously submitted prompt lines plus a replay cursor.
///
/// Navigating up preserves the in-progress draft; submitting resets the
/// cursor past the end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
    draft: Option<String>,
}

impl InputHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Record a submitted line and reset navigation past the end.
    pub fn record_entry(&mut self, text: String) {
        self.entries.push(text);
        self.cursor = None;
        self.draft = None;
    }

    pub fn reset_navigation(&mut self) {
        self.cursor = None;
        self.draft = None;
    }

    /// Step to the previous entry, clamped at the oldest. Captures the
    /// current input as a draft on the first step.
    pub fn previous(&mut self, current_input: &str) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        if self.cursor.is_some_and(|index| index >= self.entries.len()) {
            self.cursor = None;
        }

        if self.cursor.is_none() {
            self.draft = Some(current_input.to_string());
        }

        let new_cursor = match self.cursor {
            Some(index) if index > 0 => index - 1,
            Some(index) => index,
            None => self.entries.len() - 1,
        };

        self.cursor = Some(new_cursor);
        Some(self.entries[new_cursor].clone())
    }

    /// Step to the next entry; past the newest, restores the saved draft.
    pub fn next(&mut self) -> Option<String> {
        let current = self.cursor?;

        if current >= self.entries.len() || current + 1 >= self.entries.len() {
            self.cursor = None;
            return Some(self.draft.take().unwrap_or_default());
        }

        let next = current + 1;
        self.cursor = Some(next);
        Some(self.entries[next].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryBuffer, InputHistory};

    #[test]
    fn append_assigns_monotonic_sequence_numbers() {
        let mut history = HistoryBuffer::new();
        assert_eq!(history.append("a"), 0);
        assert_eq!(history.append("b"), 1);
        assert_eq!(history.append("c"), 2);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn pause_pins_view_while_appends_continue() {
        let mut history = HistoryBuffer::new();
        for i in 0..5 {
            history.append(format!("line {i}"));
        }
        history.pause();
        for i in 5..8 {
            history.append(format!("line {i}"));
        }
        assert_eq!(history.len(), 8);
        assert_eq!(history.view_index(), 5);

        history.resume();
        assert_eq!(history.view_index(), 8);
    }

    #[test]
    fn pause_is_idempotent() {
        let mut history = HistoryBuffer::new();
        history.append("a");
        history.pause();
        history.append("b");
        history.pause();
        assert_eq!(history.view_index(), 1);
    }

    #[test]
    fn slice_clamps_to_bounds() {
        let mut history = HistoryBuffer::new();
        for i in 0..4 {
            history.append(format!("{i}"));
        }
        let slice = history.slice(1, 3);
        assert_eq!(slice.len(), 2);
        assert_eq!(slice[0].text, "1");
        assert!(history.slice(3, 100).len() == 1);
        assert!(history.slice(9, 2).is_empty());
    }

    #[test]
    fn urgent_lines_are_flagged() {
        let mut history = HistoryBuffer::new();
        history.append("[!] something went wrong");
        history.append("plain");
        assert!(history.line(0).unwrap().is_urgent());
        assert!(!history.line(1).unwrap().is_urgent());
    }

    #[test]
    fn input_history_navigates_with_draft() {
        let mut history = InputHistory::new();
        history.record_entry("first".to_string());
        history.record_entry("second".to_string());

        assert_eq!(history.previous("draft").as_deref(), Some("second"));
        assert_eq!(history.previous("ignored").as_deref(), Some("first"));
        // Clamped at the oldest entry.
        assert_eq!(history.previous("ignored").as_deref(), Some("first"));

        assert_eq!(history.next().as_deref(), Some("second"));
        assert_eq!(history.next().as_deref(), Some("draft"));
        // Past the end there is nothing to navigate.
        assert_eq!(history.next(), None);
    }

    #[test]
    fn record_entry_resets_navigation() {
        let mut history = InputHistory::new();
        history.record_entry("one".to_string());
        assert_eq!(history.previous("").as_deref(), Some("one"));
        history.record_entry("two".to_string());
        assert_eq!(history.previous("").as_deref(), Some("two"));
    }
}
