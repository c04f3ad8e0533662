//! Cooperative session loop plumbing.
//!
//! `SessionWake` is the single channel between the terminal's background
//! threads (input, resize) and the cooperative loop. The loop's only
//! blocking operation is `SessionWake::wait`, which is always bounded when
//! a batching window is in effect, so the UI stays responsive even when a
//! build streams no output.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::core::input_event::{parse_input_events, InputEvent};
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::terminal::Terminal;
use crate::logging::debug_log;
use crate::render::{DiffRenderer, Frame};

/// Lock a mutex, recovering the guard if a holder panicked.
pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Default)]
struct WakeState {
    pending_inputs: Vec<String>,
    pending_resize: bool,
    stop_requested: bool,
}

enum WaitOutcome {
    Ready,
    TimedOut,
    Stopped,
}

/// Wake shared between the loop and the terminal's background threads.
#[derive(Default)]
pub struct SessionWake {
    state: Mutex<WakeState>,
    cvar: Condvar,
}

impl SessionWake {
    pub fn enqueue_input(&self, data: String) {
        let mut state = lock_unpoisoned(&self.state);
        state.pending_inputs.push(data);
        self.cvar.notify_one();
    }

    pub fn signal_resize(&self) {
        let mut state = lock_unpoisoned(&self.state);
        state.pending_resize = true;
        self.cvar.notify_one();
    }

    pub fn request_stop(&self) {
        let mut state = lock_unpoisoned(&self.state);
        state.stop_requested = true;
        self.cvar.notify_all();
    }

    pub fn stop_requested(&self) -> bool {
        lock_unpoisoned(&self.state).stop_requested
    }

    fn reset_for_start(&self) {
        let mut state = lock_unpoisoned(&self.state);
        state.pending_inputs.clear();
        state.pending_resize = false;
        state.stop_requested = false;
    }

    fn drain(&self) -> (Vec<String>, bool) {
        let mut state = lock_unpoisoned(&self.state);
        let inputs = std::mem::take(&mut state.pending_inputs);
        let resize = state.pending_resize;
        state.pending_resize = false;
        (inputs, resize)
    }

    fn wait(&self, timeout: Option<Duration>) -> WaitOutcome {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = lock_unpoisoned(&self.state);
        loop {
            if state.stop_requested {
                return WaitOutcome::Stopped;
            }
            if !state.pending_inputs.is_empty() || state.pending_resize {
                return WaitOutcome::Ready;
            }

            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::TimedOut;
                    }
                    let (next, _result) = self
                        .cvar
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    state = next;
                }
                None => {
                    state = self
                        .cvar
                        .wait(state)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
            }
        }
    }
}

/// One event delivered to the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Input(InputEvent),
    /// The batching window elapsed with no input.
    TimedOut,
    /// Stop was requested; the loop should tear down.
    Stopped,
}

/// Owns the terminal, the wake, the diff renderer, and the output gate, and
/// turns raw terminal callbacks into [`SessionEvent`]s for the cooperative
/// loop.
pub struct EventLoop<T: Terminal> {
    terminal: T,
    wake: Arc<SessionWake>,
    gate: OutputGate,
    renderer: DiffRenderer,
    queued: VecDeque<InputEvent>,
    started: bool,
}

impl<T: Terminal> EventLoop<T> {
    pub fn new(terminal: T) -> Self {
        Self {
            terminal,
            wake: Arc::new(SessionWake::default()),
            gate: OutputGate::new(),
            renderer: DiffRenderer::new(),
            queued: VecDeque::new(),
            started: false,
        }
    }

    /// Shared wake; hosts hand it to cleanup hooks so an external stop
    /// request unblocks the loop.
    pub fn wake_handle(&self) -> Arc<SessionWake> {
        Arc::clone(&self.wake)
    }

    pub fn size(&self) -> (u16, u16) {
        (self.terminal.columns(), self.terminal.rows())
    }

    /// Start the terminal and switch to the alternate screen.
    pub fn start(&mut self) -> io::Result<()> {
        self.wake.reset_for_start();

        let wake_input = Arc::clone(&self.wake);
        let wake_resize = Arc::clone(&self.wake);
        self.terminal.start(
            Box::new(move |data| {
                wake_input.enqueue_input(data);
            }),
            Box::new(move || {
                wake_resize.signal_resize();
            }),
        )?;

        self.gate.push(TerminalCmd::EnterAltScreen);
        self.gate.push(TerminalCmd::BracketedPasteEnable);
        self.gate.push(TerminalCmd::HideCursor);
        self.gate.flush(&mut self.terminal);
        self.renderer.invalidate();
        self.started = true;
        debug_log("event loop started");
        Ok(())
    }

    /// Next event, blocking at most `timeout` (or indefinitely with `None`).
    pub fn poll_event(&mut self, timeout: Option<Duration>) -> SessionEvent {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return SessionEvent::Input(event);
            }
            if self.wake.stop_requested() {
                return SessionEvent::Stopped;
            }

            let (inputs, resize) = self.wake.drain();
            if resize {
                let (columns, rows) = self.size();
                self.queued.push_back(InputEvent::Resize { columns, rows });
            }
            for data in inputs {
                self.queued.extend(parse_input_events(&data));
            }
            if !self.queued.is_empty() {
                continue;
            }

            match self.wake.wait(timeout) {
                WaitOutcome::Ready => continue,
                WaitOutcome::TimedOut => return SessionEvent::TimedOut,
                WaitOutcome::Stopped => return SessionEvent::Stopped,
            }
        }
    }

    /// Render a frame through the diff renderer and flush it.
    pub fn draw(&mut self, frame: &Frame) {
        let (columns, rows) = self.size();
        self.renderer.draw(frame, columns, rows, &mut self.gate);
        self.gate.flush(&mut self.terminal);
    }

    /// Leave the alternate screen and restore the terminal. Idempotent.
    pub fn stop(&mut self) -> io::Result<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;

        self.gate.push(TerminalCmd::BracketedPasteDisable);
        self.gate.push(TerminalCmd::ShowCursor);
        self.gate.push(TerminalCmd::LeaveAltScreen);
        self.gate.flush(&mut self.terminal);

        self.terminal.drain_input(1000, 50);
        let result = self.terminal.stop();
        debug_log("event loop stopped");
        result
    }
}

impl<T: Terminal> Drop for EventLoop<T> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::{SessionEvent, SessionWake};

    #[test]
    fn wait_times_out_within_bounds() {
        let wake = SessionWake::default();
        let start = Instant::now();
        let outcome = wake.wait(Some(Duration::from_millis(30)));
        assert!(matches!(outcome, super::WaitOutcome::TimedOut));
        assert!(start.elapsed() >= Duration::from_millis(25));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn enqueued_input_wakes_a_waiter() {
        let wake = Arc::new(SessionWake::default());
        let waker = Arc::clone(&wake);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            waker.enqueue_input("x".to_string());
        });

        let outcome = wake.wait(Some(Duration::from_secs(5)));
        assert!(matches!(outcome, super::WaitOutcome::Ready));
        let (inputs, resize) = wake.drain();
        assert_eq!(inputs, vec!["x".to_string()]);
        assert!(!resize);
        handle.join().expect("waker thread");
    }

    #[test]
    fn stop_request_unblocks_and_reports_stopped() {
        let wake = Arc::new(SessionWake::default());
        let stopper = Arc::clone(&wake);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            stopper.request_stop();
        });

        let outcome = wake.wait(None);
        assert!(matches!(outcome, super::WaitOutcome::Stopped));
        handle.join().expect("stopper thread");
    }

    #[test]
    fn session_event_equality_for_timeouts() {
        assert_eq!(SessionEvent::TimedOut, SessionEvent::TimedOut);
        assert_ne!(SessionEvent::TimedOut, SessionEvent::Stopped);
    }
}
