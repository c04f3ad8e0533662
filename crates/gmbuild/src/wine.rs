//! WINE invocation strings and lifecycle helpers.
//!
//! The session engine treats every command line here opaquely; this module
//! is the single place that knows how the external tools are started and
//! how the shared wineserver is brought down.

use std::process::{Command, Stdio};

/// Silence the WINE debug channels so build output stays readable.
pub const WINEDEBUG: &str = "warn-all,fixme-all,trace-all,err-all";

/// Whether `wine` resolves on PATH. Absence is an unrecoverable startup
/// failure.
pub fn wine_available() -> bool {
    Command::new("sh")
        .arg("-c")
        .arg("command -v wine")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// The login name WINE paths are built around.
pub fn system_user() -> Option<String> {
    match std::env::var("USER") {
        Ok(user) if !user.trim().is_empty() => Some(user),
        _ => {
            let output = Command::new("id").arg("-un").output().ok()?;
            if !output.status.success() {
                return None;
            }
            let user = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if user.is_empty() {
                None
            } else {
                Some(user)
            }
        }
    }
}

/// Compiler invocation: run Igor under the prefix against an options file.
pub fn igor_command_line(prefix: &str, igor_path: &str, options_path: &str) -> String {
    format!(
        "env WINEPREFIX=\"{prefix}\" env WINEDEBUG=\"{WINEDEBUG}\" wine \"{igor_path}\" -options={options_path} -v -- Windows Run"
    )
}

/// Secondary instance: run the built artifact through Runner.
pub fn runner_command_line(prefix: &str, runner_path: &str, game_file: &str) -> String {
    format!(
        "env WINEPREFIX=\"{prefix}\" env WINEDEBUG=\"{WINEDEBUG}\" wine \"{runner_path}\" -game \"{game_file}\""
    )
}

/// Graceful stop of the prefix's wineserver.
///
/// This kills the *whole* server for the prefix — every WINE process
/// attached to it, not only processes this program spawned. There is no
/// narrower handle.
pub fn wineserver_kill_command(prefix: &str) -> String {
    format!("env WINEPREFIX=\"{prefix}\" wineserver -k")
}

/// Unscoped wineserver kill for the default prefix; used by the
/// `kill wineserver` command and the emergency cleanup path.
pub fn kill_wineserver() {
    let _ = Command::new("sh")
        .arg("-c")
        .arg("wineserver -k")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

/// Delete the generated build tree under the prefix.
pub fn clean_build_tree(prefix: &str) -> std::io::Result<()> {
    let dir = std::path::Path::new(prefix).join("drive_c/users/gmbuild");
    match std::fs::remove_dir_all(&dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
