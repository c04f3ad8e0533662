//! External process supervision with guaranteed teardown.
//!
//! A [`ProcessHandle`] owns one OS process and exactly one [`StreamReader`]
//! bound to its stdout; no other component may read from the same stream.
//! The [`ProcessSupervisor`] tracks every handle spawned during a build
//! screen and tears all of them down in the one safe order: stop the
//! umbrella service, kill the children, then join the readers — signal/kill
//! always happens before join so a reader blocked on a live stream is
//! unblocked by EOF first.

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::logging::debug_log;
use crate::platform::stream_reader::StreamReader;

/// How long a killed/stopped child gets to exit before the unconditional
/// kill signal.
const TERMINATE_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Running,
    Terminating,
    Dead,
}

pub struct ProcessHandle {
    label: String,
    child: Option<Child>,
    reader: Option<StreamReader>,
    state: HandleState,
}

impl ProcessHandle {
    /// Spawn `command_line` through `sh -c` with stdout piped to a new
    /// reader. The command line is treated opaquely; any environment
    /// overrides are part of the string.
    ///
    /// A failed spawn yields a handle already in [`HandleState::Dead`] with
    /// no resources held.
    pub fn spawn(label: &str, command_line: &str) -> Self {
        Self::spawn_with_shell("sh", label, command_line)
    }

    fn spawn_with_shell(shell: &str, label: &str, command_line: &str) -> Self {
        let spawned = Command::new(shell)
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                let reader = child
                    .stdout
                    .take()
                    .map(|stdout| StreamReader::spawn(label, stdout));
                debug_log(&format!("spawned process '{label}'"));
                Self {
                    label: label.to_string(),
                    child: Some(child),
                    reader,
                    state: HandleState::Running,
                }
            }
            Err(err) => {
                debug_log(&format!("spawn failed for '{label}': {err}"));
                Self {
                    label: label.to_string(),
                    child: None,
                    reader: None,
                    state: HandleState::Dead,
                }
            }
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == HandleState::Dead
    }

    /// Next line from this process's stdout, waiting at most `timeout`.
    pub fn read_line(&self, timeout: Duration) -> Option<String> {
        self.reader.as_ref()?.read_line(timeout)
    }

    /// Next line without waiting.
    pub fn try_read_line(&self) -> Option<String> {
        self.reader.as_ref()?.try_read_line()
    }

    /// Kill the process (grace period first, then unconditionally), then
    /// join its reader. Idempotent; never raises for an already-dead child.
    pub fn terminate(&mut self) {
        if self.state == HandleState::Dead && self.child.is_none() && self.reader.is_none() {
            return;
        }
        self.state = HandleState::Terminating;

        if let Some(mut child) = self.child.take() {
            let exited = matches!(child.wait_timeout(TERMINATE_GRACE), Ok(Some(_)));
            if !exited {
                let _ = child.kill();
                let _ = child.wait();
            }
            debug_log(&format!("terminated process '{}'", self.label));
        }

        // The child is gone, so its stdout has hit EOF and the reader's
        // blocking read has returned; joining cannot deadlock now.
        if let Some(mut reader) = self.reader.take() {
            reader.terminate();
        }

        self.state = HandleState::Dead;
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Owns every process spawned for a build screen plus the umbrella stop
/// command for the shared background service.
pub struct ProcessSupervisor {
    handles: Vec<ProcessHandle>,
    umbrella_stop: Option<String>,
}

impl ProcessSupervisor {
    /// `umbrella_stop`, when set, is run first during [`terminate_all`]:
    /// a best-effort graceful stop of the shared coordination service.
    ///
    /// That stop is **global**: it brings down the whole service (and every
    /// process attached to it), not only processes this supervisor spawned.
    /// There is no handle that distinguishes ours from anyone else's.
    ///
    /// [`terminate_all`]: ProcessSupervisor::terminate_all
    pub fn new(umbrella_stop: Option<String>) -> Self {
        Self {
            handles: Vec::new(),
            umbrella_stop,
        }
    }

    /// Spawn the primary process for a build screen.
    pub fn spawn(&mut self, label: &str, command_line: &str) -> HandleState {
        let handle = ProcessHandle::spawn(label, command_line);
        let state = handle.state();
        self.handles.push(handle);
        state
    }

    /// Spawn an additional independent instance; the primary handle's reader
    /// and indices are untouched.
    pub fn launch_secondary(&mut self, label: &str, command_line: &str) -> HandleState {
        self.spawn(label, command_line)
    }

    pub fn handles(&self) -> &[ProcessHandle] {
        &self.handles
    }

    /// Drain every line currently queued on any handle, in handle order.
    /// Per-stream ordering is preserved; cross-stream interleaving is
    /// arrival order only.
    pub fn drain_available(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for handle in &self.handles {
            while let Some(line) = handle.try_read_line() {
                lines.push(line);
            }
        }
        lines
    }

    /// Blocking variant of [`drain_available`] for the first line: waits at
    /// most `timeout` on the primary handle.
    ///
    /// [`drain_available`]: ProcessSupervisor::drain_available
    pub fn read_primary_line(&self, timeout: Duration) -> Option<String> {
        self.handles.first()?.read_line(timeout)
    }

    /// Stop everything: umbrella service first, then kill every child, then
    /// join every reader. Safe to call multiple times; already-exited
    /// processes are not an error.
    pub fn terminate_all(&mut self) {
        if let Some(stop) = self.umbrella_stop.clone() {
            debug_log("running umbrella stop command");
            let _ = Command::new("sh")
                .arg("-c")
                .arg(&stop)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }

        for handle in &mut self.handles {
            handle.terminate();
        }
        self.handles.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.terminate_all();
    }
}
