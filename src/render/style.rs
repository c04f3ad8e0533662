//! ANSI attribute helpers used by the widgets and screens.
//!
//! Each helper wraps text in the attribute and a reset so styled segments
//! compose without leaking attributes into neighboring cells.

const RESET: &str = "\x1b[0m";

/// Title bar: black on white, the full-width banner row.
pub fn title_bar(text: &str) -> String {
    format!("\x1b[30;47m{text}{RESET}")
}

/// Selected list row: black on cyan.
pub fn selected(text: &str) -> String {
    format!("\x1b[30;46m{text}{RESET}")
}

/// Plain list row / informational accent: cyan.
pub fn accent(text: &str) -> String {
    format!("\x1b[36m{text}{RESET}")
}

/// Urgent log line: red.
pub fn urgent(text: &str) -> String {
    format!("\x1b[31m{text}{RESET}")
}

/// Ghost autocomplete hint: dim.
pub fn hint(text: &str) -> String {
    format!("\x1b[2m{text}{RESET}")
}

#[cfg(test)]
mod tests {
    use crate::core::text::visible_width;

    #[test]
    fn styles_do_not_change_visible_width() {
        for styled in [
            super::title_bar("abc"),
            super::selected("abc"),
            super::accent("abc"),
            super::urgent("abc"),
            super::hint("abc"),
        ] {
            assert_eq!(visible_width(&styled), 3);
            assert!(styled.ends_with("\x1b[0m"));
        }
    }
}
