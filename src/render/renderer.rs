//! Fullscreen diff renderer.
//!
//! Tracks the previously flushed frame and rewrites only rows whose content
//! changed, keeping redraws flicker-free. A size change invalidates the
//! cache and forces a clear + full repaint. All output flows through the
//! [`OutputGate`].

use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::text::truncate_to_width;
use crate::render::frame::Frame;

#[derive(Debug, Default)]
pub struct DiffRenderer {
    last_rows: Vec<String>,
    last_size: Option<(u16, u16)>,
    cursor_shown: bool,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached frame so the next draw repaints everything.
    pub fn invalidate(&mut self) {
        self.last_rows.clear();
        self.last_size = None;
    }

    /// Queue the terminal commands that bring the screen to `frame`.
    ///
    /// `columns`/`rows` is the current viewport; rows beyond the frame are
    /// cleared, frame rows beyond the viewport are dropped, and every row is
    /// clipped to the viewport width.
    pub fn draw(&mut self, frame: &Frame, columns: u16, rows: u16, gate: &mut OutputGate) {
        let full_repaint = self.last_size != Some((columns, rows));
        if full_repaint {
            self.last_rows.clear();
            self.last_size = Some((columns, rows));
            gate.push(TerminalCmd::HideCursor);
            self.cursor_shown = false;
            gate.push(TerminalCmd::ClearScreen);
        } else if self.cursor_shown {
            // Hide while repositioning so partial updates never flicker the
            // hardware cursor across the screen.
            gate.push(TerminalCmd::HideCursor);
            self.cursor_shown = false;
        }

        let height = rows as usize;
        for row in 0..height {
            let desired = frame.rows().get(row).map(String::as_str).unwrap_or("");
            let clipped = truncate_to_width(desired, columns as usize, false);
            if !full_repaint && self.last_rows.get(row).map(String::as_str) == Some(&clipped[..]) {
                continue;
            }

            gate.push(TerminalCmd::MoveTo {
                row: row as u16,
                col: 0,
            });
            if !clipped.is_empty() {
                gate.push(TerminalCmd::Bytes(clipped.clone()));
            }
            gate.push(TerminalCmd::ClearToLineEnd);

            if self.last_rows.len() <= row {
                self.last_rows.resize(row + 1, String::new());
            }
            self.last_rows[row] = clipped;
        }
        self.last_rows.truncate(height);

        if let Some(cursor) = frame.cursor() {
            if cursor.row < rows && cursor.col < columns {
                gate.push(TerminalCmd::MoveTo {
                    row: cursor.row,
                    col: cursor.col,
                });
                gate.push(TerminalCmd::ShowCursor);
                self.cursor_shown = true;
            }
        }
    }
}
