use std::process::ExitCode;

use autoload_store::{default_snapshot_path, load_snapshot};
use gmbuild::app::Session;
use gmbuild::tui::SessionUi;
use gmbuild::wine;
use kiln_tui::platform::{install_panic_hook, install_signal_handlers, HookTerminal};
use kiln_tui::ProcessTerminal;

/// Terminal restore sequence for the crash/interrupt paths: leave the
/// alternate screen, show the cursor, drop bracketed paste.
const EMERGENCY_RESTORE: &str = "\x1b[?1049l\x1b[?25h\x1b[?2004l";

fn emergency_cleanup() {
    // Global kill: brings down the default wineserver and everything
    // attached to it, not only processes this session spawned.
    wine::kill_wineserver();
    HookTerminal::new().write_best_effort(EMERGENCY_RESTORE);
}

fn main() -> ExitCode {
    let Some(user) = wine::system_user() else {
        eprintln!("Failed to fetch system user name, exiting...");
        return ExitCode::FAILURE;
    };

    if !wine::wine_available() {
        eprintln!("WINE is not installed, exiting...");
        return ExitCode::FAILURE;
    }

    // Snapshot restore is best-effort: any load failure means "no snapshot"
    // and the selection screens run normally.
    let snapshot = default_snapshot_path()
        .and_then(|path| load_snapshot(&path))
        .ok();

    let session = Session::new(&user);
    let terminal = ProcessTerminal::new();
    let mut ui = SessionUi::new(terminal, session);

    // Interrupt and panic paths must still kill the external processes and
    // restore the terminal before the process dies.
    let wake = ui.wake_handle();
    let signal_guard = install_signal_handlers(move || {
        emergency_cleanup();
        wake.request_stop();
        std::process::exit(0);
    });
    let _signal_guard = match signal_guard {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to install signal handlers: {err}");
            return ExitCode::FAILURE;
        }
    };
    let _panic_guard = install_panic_hook(emergency_cleanup);

    match ui.run(snapshot) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("terminal error: {err}");
            ExitCode::FAILURE
        }
    }
}
