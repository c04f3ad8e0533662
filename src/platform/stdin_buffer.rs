//! Input buffering for chunked terminal streams.
//!
//! Terminals deliver escape sequences in arbitrary chunks: a lone ESC may be
//! the Escape key or the first byte of an arrow sequence that arrives in the
//! next read. The buffer holds incomplete sequences briefly and flushes them
//! as-is once the hold window expires, so a bare Escape still gets through.

use std::time::{Duration, Instant};

const PASTE_START: &[u8] = b"\x1b[200~";
const PASTE_END: &[u8] = b"\x1b[201~";

/// Extra patience for bracketed paste payloads, which can span many reads.
const PASTE_HOLD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinEvent {
    /// A complete escape sequence or a run of printable text.
    Data(String),
    /// A bracketed paste payload (markers stripped).
    Paste(String),
}

pub struct StdinBuffer {
    pending: Vec<u8>,
    pending_since: Option<Instant>,
    hold: Duration,
}

impl StdinBuffer {
    pub fn new(hold_ms: u64) -> Self {
        Self {
            pending: Vec::new(),
            pending_since: None,
            hold: Duration::from_millis(hold_ms),
        }
    }

    /// Feed raw bytes and collect every event that is complete so far.
    pub fn process(&mut self, bytes: &[u8]) -> Vec<StdinEvent> {
        self.pending.extend_from_slice(bytes);
        self.extract(Instant::now())
    }

    /// Flush a held incomplete sequence once its hold window has expired.
    pub fn flush_due(&mut self, now: Instant) -> Vec<StdinEvent> {
        let Some(since) = self.pending_since else {
            return Vec::new();
        };
        if now.duration_since(since) < self.current_hold() {
            return Vec::new();
        }

        let data = std::mem::take(&mut self.pending);
        self.pending_since = None;
        if data.is_empty() {
            return Vec::new();
        }
        vec![StdinEvent::Data(
            String::from_utf8_lossy(&data).into_owned(),
        )]
    }

    /// Poll timeout for the reader loop: the remaining hold time when a
    /// sequence is pending, `default_ms` otherwise.
    pub fn next_timeout_ms(&self, now: Instant, default_ms: i32) -> i32 {
        match self.pending_since {
            Some(since) => {
                let hold = self.current_hold();
                let elapsed = now.duration_since(since);
                let remaining = hold.saturating_sub(elapsed);
                (remaining.as_millis() as i32).max(1)
            }
            None => default_ms,
        }
    }

    fn current_hold(&self) -> Duration {
        if self.pending.starts_with(PASTE_START) {
            PASTE_HOLD
        } else {
            self.hold
        }
    }

    fn extract(&mut self, now: Instant) -> Vec<StdinEvent> {
        let mut events = Vec::new();

        loop {
            if self.pending.is_empty() {
                self.pending_since = None;
                break;
            }

            if self.pending.starts_with(PASTE_START) {
                match find_subslice(&self.pending[PASTE_START.len()..], PASTE_END) {
                    Some(rel) => {
                        let content_end = PASTE_START.len() + rel;
                        let content =
                            String::from_utf8_lossy(&self.pending[PASTE_START.len()..content_end])
                                .into_owned();
                        self.pending.drain(..content_end + PASTE_END.len());
                        events.push(StdinEvent::Paste(content));
                        continue;
                    }
                    None => {
                        self.pending_since.get_or_insert(now);
                        break;
                    }
                }
            }

            if self.pending[0] == 0x1b {
                match escape_sequence_len(&self.pending) {
                    Some(len) => {
                        let seq: Vec<u8> = self.pending.drain(..len).collect();
                        events.push(StdinEvent::Data(
                            String::from_utf8_lossy(&seq).into_owned(),
                        ));
                        continue;
                    }
                    None => {
                        self.pending_since.get_or_insert(now);
                        break;
                    }
                }
            }

            // Run of non-escape bytes up to the next ESC.
            let run_end = self
                .pending
                .iter()
                .position(|&b| b == 0x1b)
                .unwrap_or(self.pending.len());
            let run = &self.pending[..run_end];

            match std::str::from_utf8(run) {
                Ok(text) => {
                    events.push(StdinEvent::Data(text.to_string()));
                    self.pending.drain(..run_end);
                }
                Err(err) if err.error_len().is_none() && run_end == self.pending.len() => {
                    // Incomplete UTF-8 at the tail: emit the valid prefix and
                    // hold the rest.
                    let valid = err.valid_up_to();
                    if valid > 0 {
                        let text =
                            String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                        events.push(StdinEvent::Data(text));
                        self.pending.drain(..valid);
                    }
                    self.pending_since.get_or_insert(now);
                    break;
                }
                Err(_) => {
                    events.push(StdinEvent::Data(
                        String::from_utf8_lossy(run).into_owned(),
                    ));
                    self.pending.drain(..run_end);
                }
            }
        }

        if self.pending.is_empty() {
            self.pending_since = None;
        }
        events
    }
}

/// Byte length of a complete escape sequence at the start of `bytes`, or
/// `None` while more bytes could still arrive.
fn escape_sequence_len(bytes: &[u8]) -> Option<usize> {
    match bytes.get(1) {
        None => None,
        Some(b'[') => {
            for (offset, &byte) in bytes.iter().enumerate().skip(2) {
                if (0x40..=0x7e).contains(&byte) {
                    return Some(offset + 1);
                }
            }
            None
        }
        Some(b'O') => {
            if bytes.len() >= 3 {
                Some(3)
            } else {
                None
            }
        }
        // ESC plus any other byte: alt-modified key, deliver as a pair.
        Some(_) => Some(2),
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{StdinBuffer, StdinEvent};

    #[test]
    fn complete_sequences_pass_through() {
        let mut buffer = StdinBuffer::new(10);
        let events = buffer.process(b"\x1b[A");
        assert_eq!(events, vec![StdinEvent::Data("\x1b[A".to_string())]);
    }

    #[test]
    fn split_sequence_is_reassembled() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b[").is_empty());
        let events = buffer.process(b"B");
        assert_eq!(events, vec![StdinEvent::Data("\x1b[B".to_string())]);
    }

    #[test]
    fn bare_escape_flushes_after_hold() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b").is_empty());

        let now = Instant::now();
        assert!(buffer.flush_due(now).is_empty());
        let later = now + Duration::from_millis(20);
        let events = buffer.flush_due(later);
        assert_eq!(events, vec![StdinEvent::Data("\x1b".to_string())]);
    }

    #[test]
    fn text_and_sequence_in_one_chunk_split_into_events() {
        let mut buffer = StdinBuffer::new(10);
        let events = buffer.process(b"ab\x1b[C");
        assert_eq!(
            events,
            vec![
                StdinEvent::Data("ab".to_string()),
                StdinEvent::Data("\x1b[C".to_string()),
            ]
        );
    }

    #[test]
    fn paste_spanning_chunks_is_accumulated() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b[200~hello ").is_empty());
        let events = buffer.process(b"world\x1b[201~");
        assert_eq!(events, vec![StdinEvent::Paste("hello world".to_string())]);
    }

    #[test]
    fn pending_paste_extends_the_poll_timeout() {
        let mut buffer = StdinBuffer::new(10);
        let _ = buffer.process(b"\x1b[200~partial");
        let timeout = buffer.next_timeout_ms(Instant::now(), 50);
        assert!(timeout > 10);
    }

    #[test]
    fn incomplete_utf8_tail_is_held() {
        let mut buffer = StdinBuffer::new(10);
        // "é" is 0xC3 0xA9; feed the first byte only.
        let events = buffer.process(b"a\xc3");
        assert_eq!(events, vec![StdinEvent::Data("a".to_string())]);
        let events = buffer.process(b"\xa9");
        assert_eq!(events, vec![StdinEvent::Data("é".to_string())]);
    }
}
