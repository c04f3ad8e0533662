//! Environment configuration.

use std::env;

#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Mirror every terminal write to this file (`KILN_TUI_WRITE_LOG`).
    pub tui_write_log: Option<String>,
    /// Append engine debug events to this file (`KILN_TUI_DEBUG_LOG`).
    pub debug_log: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            tui_write_log: env_string_opt("KILN_TUI_WRITE_LOG"),
            debug_log: env_string_opt("KILN_TUI_DEBUG_LOG"),
        }
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::EnvConfig;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_are_unset() {
        let _lock = env_lock();
        let _g1 = set_env_guard("KILN_TUI_WRITE_LOG", None);
        let _g2 = set_env_guard("KILN_TUI_DEBUG_LOG", None);

        let config = EnvConfig::from_env();
        assert!(config.tui_write_log.is_none());
        assert!(config.debug_log.is_none());
    }

    #[test]
    fn empty_values_are_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard("KILN_TUI_WRITE_LOG", Some(""));
        let _g2 = set_env_guard("KILN_TUI_DEBUG_LOG", Some("  "));
        let config = EnvConfig::from_env();
        assert!(config.tui_write_log.is_none());
        assert!(config.debug_log.is_none());
    }

    #[test]
    fn set_values_are_read() {
        let _lock = env_lock();
        let _g1 = set_env_guard("KILN_TUI_WRITE_LOG", Some("/tmp/kiln-writes.log"));
        let _g2 = set_env_guard("KILN_TUI_DEBUG_LOG", Some("/tmp/kiln-debug.log"));
        let config = EnvConfig::from_env();
        assert_eq!(config.tui_write_log.as_deref(), Some("/tmp/kiln-writes.log"));
        assert_eq!(config.debug_log.as_deref(), Some("/tmp/kiln-debug.log"));
    }
}
