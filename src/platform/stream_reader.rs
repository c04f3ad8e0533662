//! Background line reader decoupling a blocking stream from the session loop.
//!
//! One reader owns one stream. The reader thread performs blocking line
//! reads and pushes each line onto an unbounded channel; the consumer side
//! polls with a bounded timeout and never blocks past it.
//!
//! Teardown ordering contract: the thread may sit in a blocking read until
//! the stream reaches end-of-input, so the owner must close or kill the
//! producing process *before* calling [`StreamReader::terminate`] — the
//! process's death delivers EOF and unblocks the final read.

use std::io::{BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct StreamReader {
    receiver: Receiver<String>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl StreamReader {
    /// Start a reader thread over `stream`. `label` names the thread for
    /// diagnostics.
    pub fn spawn<R>(label: &str, stream: R) -> Self
    where
        R: Read + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_flag);

        let thread = thread::Builder::new()
            .name(format!("stream-reader-{label}"))
            .spawn(move || {
                let mut reader = BufReader::new(stream);
                let mut buf = Vec::new();
                while !thread_stop.load(Ordering::SeqCst) {
                    buf.clear();
                    match reader.read_until(b'\n', &mut buf) {
                        Ok(0) => break,
                        Ok(_) => {
                            while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
                                buf.pop();
                            }
                            let line = String::from_utf8_lossy(&buf).into_owned();
                            if sender.send(line).is_err() {
                                break;
                            }
                        }
                        Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(_) => break,
                    }
                }
            })
            .ok();

        Self {
            receiver,
            stop_flag,
            thread,
        }
    }

    /// Next queued line, waiting at most `timeout`. `None` means no data
    /// arrived in time (or the stream ended and the queue is drained).
    pub fn read_line(&self, timeout: Duration) -> Option<String> {
        match self.receiver.recv_timeout(timeout) {
            Ok(line) => Some(line),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Next queued line without waiting.
    pub fn try_read_line(&self) -> Option<String> {
        self.receiver.try_recv().ok()
    }

    /// Signal the reader thread to stop and join it.
    ///
    /// Idempotent and safe after EOF. Blocks until no read is in flight;
    /// see the module docs for the required close-before-terminate ordering.
    pub fn terminate(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        self.terminate();
    }
}
