//! ANSI-aware width, truncation, and wrapping helpers.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

const ANSI_RESET: &str = "\x1b[0m";

/// Iterate grapheme clusters of `text`.
pub fn grapheme_segments(text: &str) -> unicode_segmentation::Graphemes<'_> {
    UnicodeSegmentation::graphemes(text, true)
}

/// Byte length of the escape sequence starting at `idx`, if one starts there.
///
/// Recognizes CSI (`ESC [ ... final`), SS3 (`ESC O x`), and OSC
/// (`ESC ] ... BEL` or `ESC ] ... ESC \`) sequences.
pub fn ansi_sequence_len(input: &str, idx: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.get(idx) != Some(&0x1b) {
        return None;
    }

    match bytes.get(idx + 1) {
        Some(b'[') => {
            let mut end = idx + 2;
            while let Some(&byte) = bytes.get(end) {
                if (0x40..=0x7e).contains(&byte) {
                    return Some(end - idx + 1);
                }
                end += 1;
            }
            None
        }
        Some(b'O') => bytes.get(idx + 2).map(|_| 3),
        Some(b']') => {
            let mut end = idx + 2;
            while let Some(&byte) = bytes.get(end) {
                if byte == 0x07 {
                    return Some(end - idx + 1);
                }
                if byte == 0x1b && bytes.get(end + 1) == Some(&b'\\') {
                    return Some(end - idx + 2);
                }
                end += 1;
            }
            None
        }
        _ => None,
    }
}

fn grapheme_width(grapheme: &str) -> usize {
    grapheme
        .chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

/// Display width of `input`, ignoring ANSI control sequences.
pub fn visible_width(input: &str) -> usize {
    if input.is_empty() {
        return 0;
    }

    let mut clean = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(len) = ansi_sequence_len(input, idx) {
            idx += len;
            continue;
        }
        let ch = match input[idx..].chars().next() {
            Some(ch) => ch,
            None => break,
        };
        clean.push(ch);
        idx += ch.len_utf8();
    }

    clean.graphemes(true).map(grapheme_width).sum()
}

/// Truncate `text` to at most `max_width` columns, preserving embedded ANSI
/// codes and appending a reset if any were kept. Optionally pads with spaces
/// up to `max_width`.
pub fn truncate_to_width(text: &str, max_width: usize, pad: bool) -> String {
    if max_width == 0 {
        return String::new();
    }

    let text_width = visible_width(text);
    if text_width <= max_width {
        if pad {
            let mut out = text.to_string();
            out.push_str(&" ".repeat(max_width - text_width));
            return out;
        }
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut current_width = 0;
    let mut saw_ansi = false;
    let mut idx = 0;
    while idx < text.len() {
        if let Some(len) = ansi_sequence_len(text, idx) {
            out.push_str(&text[idx..idx + len]);
            saw_ansi = true;
            idx += len;
            continue;
        }

        let end = next_ansi_or_end(text, idx);
        for grapheme in grapheme_segments(&text[idx..end]) {
            let width = grapheme_width(grapheme);
            if current_width + width > max_width {
                if saw_ansi {
                    out.push_str(ANSI_RESET);
                }
                if pad {
                    out.push_str(&" ".repeat(max_width - current_width));
                }
                return out;
            }
            out.push_str(grapheme);
            current_width += width;
        }
        idx = end;
    }

    if saw_ansi {
        out.push_str(ANSI_RESET);
    }
    out
}

fn next_ansi_or_end(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let mut idx = from;
    while idx < bytes.len() {
        if bytes[idx] == 0x1b {
            return idx;
        }
        idx += 1;
    }
    text.len()
}

/// Hard-wrap plain text into chunks of at most `width` columns.
///
/// Intended for log lines that have already had control bytes stripped; ANSI
/// sequences in the input would be split across chunks.
pub fn wrap_plain(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    if text.is_empty() {
        return vec![String::new()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for grapheme in grapheme_segments(text) {
        let gw = grapheme_width(grapheme);
        if current_width + gw > width && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push_str(grapheme);
        current_width += gw;
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Replace tabs and strip control bytes so a log line is safe to draw.
pub fn sanitize_line(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\t' {
            out.push_str("   ");
        } else if !ch.is_control() {
            out.push(ch);
        }
    }
    out
}
