//! Debug log sink.
//!
//! The engine owns the terminal, so diagnostics go to a file, never stdout.
//! The sink is disabled unless `KILN_TUI_DEBUG_LOG` names a writable path,
//! and goes silent after the first write failure rather than disturbing the
//! session.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::config::EnvConfig;

struct DebugLogState {
    path: Option<PathBuf>,
    failed: bool,
}

static DEBUG_LOG: Lazy<Mutex<DebugLogState>> = Lazy::new(|| {
    let config = EnvConfig::from_env();
    Mutex::new(DebugLogState {
        path: config.debug_log.map(PathBuf::from),
        failed: false,
    })
});

/// Append one line to the debug log, if configured.
pub fn debug_log(message: &str) {
    let mut state = match DEBUG_LOG.lock() {
        Ok(state) => state,
        Err(poisoned) => poisoned.into_inner(),
    };
    if state.failed {
        return;
    }
    let Some(path) = state.path.clone() else {
        return;
    };

    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut file| writeln!(file, "{message}"));
    if result.is_err() {
        state.failed = true;
    }
}

/// Point the sink at an explicit path (tests) or disable it with `None`.
pub fn set_debug_log_path(path: Option<PathBuf>) {
    let mut state = match DEBUG_LOG.lock() {
        Ok(state) => state,
        Err(poisoned) => poisoned.into_inner(),
    };
    state.path = path;
    state.failed = false;
}

#[cfg(test)]
mod tests {
    use super::{debug_log, set_debug_log_path};

    #[test]
    fn writes_lines_when_configured() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("debug.log");
        set_debug_log_path(Some(path.clone()));
        debug_log("first");
        debug_log("second");
        set_debug_log_path(None);

        let content = std::fs::read_to_string(&path).expect("log readable");
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn silent_after_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory path cannot be opened for append; the sink must fail
        // quietly and stay disabled.
        set_debug_log_path(Some(dir.path().to_path_buf()));
        debug_log("dropped");
        debug_log("also dropped");
        set_debug_log_path(None);
    }
}
