pub mod process_terminal;
pub mod stdin_buffer;
pub mod stream_reader;
pub mod supervisor;

#[cfg(unix)]
pub use process_terminal::{
    install_panic_hook, install_signal_handlers, HookTerminal, PanicHookGuard, ProcessTerminal,
    SignalHookGuard,
};
#[cfg(not(unix))]
pub use process_terminal::ProcessTerminal;
pub use stream_reader::StreamReader;
pub use supervisor::{HandleState, ProcessHandle, ProcessSupervisor};
