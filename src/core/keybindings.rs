//! Session keybindings.
//!
//! Keys are a configuration surface, not a hard contract: every screen
//! resolves raw input through this action map, so hosts can rebind the
//! live-build keys without touching screen logic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use once_cell::sync::Lazy;

use crate::core::input::matches_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionAction {
    CursorLeft,
    CursorRight,
    CursorLineStart,
    CursorLineEnd,
    DeleteCharBackward,
    ClearLine,
    HistoryPrevious,
    HistoryNext,
    AcceptHint,
    Submit,
    SelectUp,
    SelectDown,
    SelectConfirm,
    Interrupt,
    BuildQuit,
    BuildPauseToggle,
    BuildDump,
    BuildLaunchInstance,
}

pub type KeyId = String;

#[derive(Debug, Clone)]
pub enum KeyBinding {
    Single(KeyId),
    Multiple(Vec<KeyId>),
}

impl From<&str> for KeyBinding {
    fn from(value: &str) -> Self {
        KeyBinding::Single(value.to_string())
    }
}

impl From<Vec<&str>> for KeyBinding {
    fn from(value: Vec<&str>) -> Self {
        KeyBinding::Multiple(value.into_iter().map(|item| item.to_string()).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionKeybindingsConfig {
    entries: HashMap<SessionAction, KeyBinding>,
}

impl SessionKeybindingsConfig {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn set<K: Into<KeyBinding>>(&mut self, action: SessionAction, keys: K) {
        self.entries.insert(action, keys.into());
    }
}

pub static DEFAULT_SESSION_KEYBINDINGS: Lazy<HashMap<SessionAction, Vec<KeyId>>> =
    Lazy::new(|| {
        use SessionAction::*;

        let mut map = HashMap::new();
        map.insert(CursorLeft, vec!["left".to_string()]);
        map.insert(CursorRight, vec!["right".to_string()]);
        map.insert(
            CursorLineStart,
            vec!["home".to_string(), "ctrl+a".to_string()],
        );
        map.insert(CursorLineEnd, vec!["end".to_string(), "ctrl+e".to_string()]);
        map.insert(DeleteCharBackward, vec!["backspace".to_string()]);
        map.insert(ClearLine, vec!["ctrl+u".to_string()]);
        map.insert(HistoryPrevious, vec!["up".to_string()]);
        map.insert(HistoryNext, vec!["down".to_string()]);
        map.insert(AcceptHint, vec!["tab".to_string()]);
        map.insert(Submit, vec!["enter".to_string()]);
        map.insert(SelectUp, vec!["up".to_string()]);
        map.insert(SelectDown, vec!["down".to_string()]);
        map.insert(SelectConfirm, vec!["enter".to_string()]);
        map.insert(Interrupt, vec!["ctrl+c".to_string()]);
        map.insert(BuildQuit, vec!["q".to_string()]);
        map.insert(BuildPauseToggle, vec!["p".to_string()]);
        map.insert(BuildDump, vec!["d".to_string()]);
        map.insert(BuildLaunchInstance, vec!["x".to_string()]);

        map
    });

pub struct SessionKeybindingsManager {
    action_to_keys: HashMap<SessionAction, Vec<KeyId>>,
}

impl SessionKeybindingsManager {
    pub fn new(config: SessionKeybindingsConfig) -> Self {
        let mut manager = Self {
            action_to_keys: HashMap::new(),
        };
        manager.build_maps(&config);
        manager
    }

    fn build_maps(&mut self, config: &SessionKeybindingsConfig) {
        self.action_to_keys.clear();

        for (action, keys) in DEFAULT_SESSION_KEYBINDINGS.iter() {
            self.action_to_keys.insert(*action, keys.clone());
        }

        for (action, binding) in config.entries.iter() {
            let key_list = match binding {
                KeyBinding::Single(key) => vec![key.clone()],
                KeyBinding::Multiple(keys) => keys.clone(),
            };
            self.action_to_keys.insert(*action, key_list);
        }
    }

    pub fn matches(&self, data: &str, action: SessionAction) -> bool {
        let Some(keys) = self.action_to_keys.get(&action) else {
            return false;
        };
        keys.iter().any(|key| matches_key(data, key.as_str()))
    }

    pub fn get_keys(&self, action: SessionAction) -> Vec<KeyId> {
        self.action_to_keys.get(&action).cloned().unwrap_or_default()
    }

    pub fn set_config(&mut self, config: SessionKeybindingsConfig) {
        self.build_maps(&config);
    }
}

pub type SessionKeybindingsHandle = Arc<Mutex<SessionKeybindingsManager>>;

static GLOBAL_SESSION_KEYBINDINGS: OnceLock<SessionKeybindingsHandle> = OnceLock::new();

pub fn get_session_keybindings() -> SessionKeybindingsHandle {
    GLOBAL_SESSION_KEYBINDINGS
        .get_or_init(|| {
            Arc::new(Mutex::new(SessionKeybindingsManager::new(
                SessionKeybindingsConfig::default(),
            )))
        })
        .clone()
}

pub fn default_session_keybindings_handle() -> SessionKeybindingsHandle {
    Arc::new(Mutex::new(SessionKeybindingsManager::new(
        SessionKeybindingsConfig::default(),
    )))
}

#[cfg(test)]
mod tests {
    use super::{SessionAction, SessionKeybindingsConfig, SessionKeybindingsManager};

    #[test]
    fn defaults_match_expected_keys() {
        let manager = SessionKeybindingsManager::new(SessionKeybindingsConfig::default());
        assert!(manager.matches("\x1b[A", SessionAction::HistoryPrevious));
        assert!(manager.matches("\r", SessionAction::Submit));
        assert!(manager.matches("\t", SessionAction::AcceptHint));
        assert!(manager.matches("q", SessionAction::BuildQuit));
        assert!(manager.matches("Q", SessionAction::BuildQuit));
        assert!(manager.matches("\x03", SessionAction::Interrupt));
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut config = SessionKeybindingsConfig::default();
        config.set(SessionAction::BuildQuit, "escape");
        let manager = SessionKeybindingsManager::new(config);
        assert!(manager.matches("\x1b", SessionAction::BuildQuit));
        assert!(!manager.matches("q", SessionAction::BuildQuit));
    }
}
