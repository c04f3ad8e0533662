//! Key parsing for legacy terminal escape sequences.
//!
//! The engine targets plain curses-class terminals, so only the legacy
//! CSI/SS3 encodings and control bytes are recognized; there is no enhanced
//! keyboard protocol negotiation.

/// Best-effort normalized key identifier for a raw input sequence.
///
/// Returns `None` for printable text and for sequences the engine does not
/// recognize.
pub fn parse_key(data: &str) -> Option<String> {
    let key = match data {
        "\r" | "\n" => "enter",
        "\t" => "tab",
        "\x7f" | "\x08" => "backspace",
        "\x1b" => "escape",
        "\x1b[A" | "\x1bOA" => "up",
        "\x1b[B" | "\x1bOB" => "down",
        "\x1b[C" | "\x1bOC" => "right",
        "\x1b[D" | "\x1bOD" => "left",
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => "home",
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => "end",
        "\x1b[2~" => "insert",
        "\x1b[3~" => "delete",
        "\x1b[5~" => "pageup",
        "\x1b[6~" => "pagedown",
        "\x1b[Z" => "shift+tab",
        "\x1b[1;5C" => "ctrl+right",
        "\x1b[1;5D" => "ctrl+left",
        "\x1b[1;3C" => "alt+right",
        "\x1b[1;3D" => "alt+left",
        "\x00" => "ctrl+space",
        _ => return parse_control_byte(data),
    };
    Some(key.to_string())
}

fn parse_control_byte(data: &str) -> Option<String> {
    let mut chars = data.chars();
    let ch = chars.next()?;
    if chars.next().is_some() {
        return None;
    }

    let code = ch as u32;
    // C0 control bytes other than tab/enter/escape map to ctrl+<letter>.
    if (0x01..=0x1a).contains(&code) && !matches!(code, 0x09 | 0x0a | 0x0d) {
        let letter = (b'a' + (code as u8 - 1)) as char;
        return Some(format!("ctrl+{letter}"));
    }
    None
}

/// Decoded printable text, or `None` if `data` contains control bytes or an
/// escape sequence.
pub fn parse_text(data: &str) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    if data.chars().any(|ch| ch.is_control()) {
        return None;
    }
    Some(data.to_string())
}

/// Whether a raw sequence matches a normalized key identifier.
///
/// Single-character identifiers match printable input case-insensitively,
/// so `"q"` matches both `q` and `Q`; named identifiers (`"enter"`,
/// `"ctrl+u"`, ...) match via [`parse_key`].
pub fn matches_key(data: &str, key_id: &str) -> bool {
    if let Some(parsed) = parse_key(data) {
        return parsed == key_id;
    }

    let mut id_chars = key_id.chars();
    if let (Some(id_ch), None) = (id_chars.next(), id_chars.next()) {
        let mut data_chars = data.chars();
        if let (Some(data_ch), None) = (data_chars.next(), data_chars.next()) {
            return data_ch.eq_ignore_ascii_case(&id_ch);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{matches_key, parse_key, parse_text};

    #[test]
    fn arrows_and_navigation_keys_parse() {
        assert_eq!(parse_key("\x1b[A").as_deref(), Some("up"));
        assert_eq!(parse_key("\x1bOB").as_deref(), Some("down"));
        assert_eq!(parse_key("\x1b[1~").as_deref(), Some("home"));
        assert_eq!(parse_key("\x1b[8~").as_deref(), Some("end"));
        assert_eq!(parse_key("\x1b[3~").as_deref(), Some("delete"));
        assert_eq!(parse_key("\x1b[Z").as_deref(), Some("shift+tab"));
    }

    #[test]
    fn control_bytes_map_to_ctrl_letters() {
        assert_eq!(parse_key("\x15").as_deref(), Some("ctrl+u"));
        assert_eq!(parse_key("\x03").as_deref(), Some("ctrl+c"));
        assert_eq!(parse_key("\x01").as_deref(), Some("ctrl+a"));
    }

    #[test]
    fn tab_enter_backspace_are_named() {
        assert_eq!(parse_key("\t").as_deref(), Some("tab"));
        assert_eq!(parse_key("\r").as_deref(), Some("enter"));
        assert_eq!(parse_key("\x7f").as_deref(), Some("backspace"));
    }

    #[test]
    fn printable_text_is_not_a_key() {
        assert_eq!(parse_key("a"), None);
        assert_eq!(parse_text("abc").as_deref(), Some("abc"));
        assert_eq!(parse_text("\x1b[A"), None);
    }

    #[test]
    fn single_char_ids_match_case_insensitively() {
        assert!(matches_key("q", "q"));
        assert!(matches_key("Q", "q"));
        assert!(!matches_key("r", "q"));
        assert!(matches_key("\r", "enter"));
    }
}
