//! Teardown pressure: every exit path restores the terminal exactly once.

use std::thread;

use gmbuild::app::Session;
use gmbuild::tui::SessionUi;

mod support;

const TEST_USER: &str = "gmbuild-missing-user";

fn assert_teardown_sequences_and_counts(
    trace: &std::sync::Arc<std::sync::Mutex<support::TerminalTrace>>,
) {
    let output = support::rendered_output(trace);
    assert!(
        output.contains("\x1b[?25h"),
        "show-cursor escape was not emitted during teardown"
    );
    assert!(
        output.contains("\x1b[?1049l"),
        "alt-screen leave escape was not emitted during teardown"
    );
    assert!(
        output.contains("\x1b[?2004l"),
        "bracketed-paste disable escape was not emitted during teardown"
    );

    let trace = support::lock_unpoisoned(trace);
    assert_eq!(trace.start_calls, 1, "terminal should start once");
    assert_eq!(trace.stop_calls, 1, "terminal should stop once");
    assert_eq!(
        trace.drain_calls.len(),
        1,
        "terminal should drain input exactly once"
    );
}

#[test]
fn exit_command_path_restores_terminal_state() {
    let (terminal, trace) = support::SharedTerminal::new(100, 30);
    let mut ui = SessionUi::new(terminal, Session::new(TEST_USER));

    let injector_trace = std::sync::Arc::clone(&trace);
    let injector = thread::spawn(move || {
        support::inject_input(&injector_trace, "exit\r");
    });

    let worker = thread::spawn(move || {
        ui.run(None).expect("session run");
        ui
    });

    injector.join().expect("injector thread");
    let ui = worker.join().expect("session thread");
    assert!(ui.session().should_exit);

    assert_teardown_sequences_and_counts(&trace);
}

#[test]
fn ctrl_c_path_restores_terminal_state() {
    let (terminal, trace) = support::SharedTerminal::new(100, 30);
    let mut ui = SessionUi::new(terminal, Session::new(TEST_USER));

    let injector_trace = std::sync::Arc::clone(&trace);
    let injector = thread::spawn(move || {
        support::inject_input(&injector_trace, "\x03");
    });

    let worker = thread::spawn(move || {
        ui.run(None).expect("session run");
        ui
    });

    injector.join().expect("injector thread");
    let ui = worker.join().expect("session thread");
    assert!(ui.session().should_exit);

    assert_teardown_sequences_and_counts(&trace);
}

#[test]
fn external_stop_request_path_restores_terminal_state() {
    let (terminal, trace) = support::SharedTerminal::new(100, 30);
    let mut ui = SessionUi::new(terminal, Session::new(TEST_USER));
    let wake = ui.wake_handle();

    let stopper = thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(50));
        wake.request_stop();
    });

    let worker = thread::spawn(move || {
        ui.run(None).expect("session run");
        ui
    });

    stopper.join().expect("stopper thread");
    let _ui = worker.join().expect("session thread");

    assert_teardown_sequences_and_counts(&trace);
}
