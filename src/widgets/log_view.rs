//! Bottom-anchored trailing window over the history buffer.
//!
//! Renders the newest visible lines (respecting the buffer's pause cursor)
//! upward from the bottom of the window, hard-wrapping long lines and
//! highlighting urgent `[!]` advisories.

use crate::core::history::HistoryBuffer;
use crate::core::text::{sanitize_line, wrap_plain};
use crate::render::style;

/// Render the history window as exactly `rows` lines, oldest first; the
/// window ends at the buffer's logical view cursor.
pub fn render_window(history: &HistoryBuffer, width: usize, rows: usize) -> Vec<String> {
    let mut rendered: Vec<String> = Vec::with_capacity(rows);
    if rows == 0 || width < 4 {
        rendered.resize(rows, String::new());
        return rendered;
    }

    let mut remaining = rows;
    let mut index = history.view_index();
    // Collected bottom-up, reversed at the end.
    while remaining > 0 && index > 0 {
        index -= 1;
        let Some(line) = history.line(index) else {
            break;
        };
        let urgent = line.is_urgent();
        let text = sanitize_line(line.text.trim_end());

        let chunks = wrap_plain(&text, width.saturating_sub(2));
        for (chunk_idx, chunk) in chunks.iter().enumerate().rev() {
            if remaining == 0 {
                break;
            }
            let prefix = if chunk_idx == 0 { ": " } else { "  " };
            let row = format!("{prefix}{chunk}");
            let row = if urgent { style::urgent(&row) } else { row };
            rendered.push(row);
            remaining -= 1;
        }
    }

    while rendered.len() < rows {
        rendered.push(String::new());
    }
    rendered.reverse();
    rendered
}
