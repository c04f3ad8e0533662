//! Prefix autocomplete over a fixed command vocabulary.

/// Lexicographically sorted command vocabulary.
///
/// Sorting happens once at construction so tie-breaks in
/// [`CommandVocabulary::best_match`] are deterministic.
#[derive(Debug, Clone)]
pub struct CommandVocabulary {
    entries: Vec<String>,
}

/// Result of a prefix scan: the winning vocabulary entry and the unmatched
/// remainder to show as an inline ghost hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    pub index: usize,
    pub hint: String,
}

impl CommandVocabulary {
    pub fn new(mut entries: Vec<String>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Vocabulary entries that are not themselves help-prefixed.
    pub fn base_entries(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(String::as_str)
            .filter(|entry| *entry != "help" && !entry.starts_with("help "))
    }

    /// Best completion for `input` by longest-common-prefix scan.
    ///
    /// The input is left-trimmed first. A candidate qualifies only if every
    /// character up to the shared length matches (one string is a prefix of
    /// the other); among qualifying candidates the greatest shared length
    /// wins, first entry winning ties. An empty input has no match.
    pub fn best_match(&self, input: &str) -> Option<PrefixMatch> {
        let trimmed = input.trim_start_matches([' ', '\t']);
        if trimmed.is_empty() {
            return None;
        }

        let mut best_len = 0usize;
        let mut best_index: Option<usize> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            let min_len = entry.len().min(trimmed.len());
            let shared = shared_prefix_len(entry, trimmed);
            if shared < min_len {
                continue;
            }
            if best_len < min_len {
                best_len = min_len;
                best_index = Some(index);
            }
        }

        let index = best_index?;
        let entry = &self.entries[index];
        let hint = entry.get(trimmed.len()..).unwrap_or("").to_string();
        Some(PrefixMatch { index, hint })
    }

    /// Hint text for the current input, empty when nothing qualifies.
    pub fn hint(&self, input: &str) -> String {
        self.best_match(input)
            .map(|m| m.hint)
            .unwrap_or_default()
    }
}

fn shared_prefix_len(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        len += ca.len_utf8();
    }
    len
}

#[cfg(test)]
mod tests {
    use super::CommandVocabulary;

    fn vocab(entries: &[&str]) -> CommandVocabulary {
        CommandVocabulary::new(entries.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn diverging_entries_are_disqualified() {
        // "exit" diverges from "exp" at index 1, so only "export autoload"
        // qualifies.
        let vocab = vocab(&["exit", "export autoload"]);
        let matched = vocab.best_match("exp").expect("match");
        assert_eq!(vocab.entry(matched.index), Some("export autoload"));
        assert_eq!(matched.hint, "ort autoload");
    }

    #[test]
    fn hint_concatenation_reproduces_a_vocabulary_member() {
        let vocab = vocab(&["exit", "export autoload", "help", "set debug"]);
        for input in ["e", "ex", "exp", "h", "set", "set d", "  set de"] {
            if let Some(matched) = vocab.best_match(input) {
                let trimmed = input.trim_start_matches([' ', '\t']);
                let full = format!("{trimmed}{}", matched.hint);
                assert!(
                    vocab.entries().iter().any(|entry| entry == &full),
                    "input {input:?} produced non-member {full:?}"
                );
            }
        }
    }

    #[test]
    fn empty_and_blank_inputs_have_no_hint() {
        let vocab = vocab(&["exit"]);
        assert_eq!(vocab.best_match(""), None);
        assert_eq!(vocab.best_match("   "), None);
        assert_eq!(vocab.hint(""), "");
    }

    #[test]
    fn no_shared_first_character_means_no_match() {
        let vocab = vocab(&["exit", "quit"]);
        assert_eq!(vocab.best_match("z"), None);
    }

    #[test]
    fn longer_input_than_entry_still_matches_with_empty_hint() {
        let vocab = vocab(&["exit"]);
        let matched = vocab.best_match("exit ").expect("match");
        assert_eq!(matched.hint, "");
        assert_eq!(vocab.entry(matched.index), Some("exit"));
    }

    #[test]
    fn ties_resolve_to_first_sorted_entry() {
        let vocab = vocab(&["set wine drive", "set wine prefix"]);
        let matched = vocab.best_match("set wine ").expect("match");
        assert_eq!(vocab.entry(matched.index), Some("set wine drive"));
    }

    #[test]
    fn base_entries_exclude_help_variants() {
        let vocab = vocab(&["exit", "help", "help exit"]);
        let base: Vec<&str> = vocab.base_entries().collect();
        assert_eq!(base, vec!["exit"]);
    }

    #[test]
    fn determinism_over_repeated_calls() {
        let vocab = vocab(&["exit", "export autoload", "set debug"]);
        let first = vocab.best_match("ex");
        for _ in 0..10 {
            assert_eq!(vocab.best_match("ex"), first);
        }
    }
}
