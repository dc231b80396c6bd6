//! Operator input, read off the async runtime

use std::io::{self, BufRead, Write};
use std::thread;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// A source of operator lines. `None` means the operator is done
/// (end of input or interrupt) and is never an error.
#[async_trait]
pub trait LineSource: Send {
    async fn next_line(&mut self) -> Option<String>;

    async fn prompt(&mut self, label: &str) -> Option<String> {
        print!("{}", label);
        io::stdout().flush().ok();
        self.next_line().await
    }
}

/// Stdin lines fed from a dedicated thread so a blocked read never holds
/// the runtime. A plain thread rather than `spawn_blocking`, since runtime
/// shutdown waits on blocking tasks and the read never returns on its own.
pub struct ConsoleInput {
    lines: mpsc::Receiver<String>,
    interrupt: CancellationToken,
}

impl ConsoleInput {
    pub fn spawn(interrupt: CancellationToken) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel(16);
        thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || forward_lines(io::stdin().lock(), tx))?;

        Ok(Self::new(rx, interrupt))
    }

    fn new(lines: mpsc::Receiver<String>, interrupt: CancellationToken) -> Self {
        Self { lines, interrupt }
    }
}

#[async_trait]
impl LineSource for ConsoleInput {
    async fn next_line(&mut self) -> Option<String> {
        if self.interrupt.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.interrupt.cancelled() => {
                // Ctrl+C leaves the cursor mid-line.
                println!();
                None
            }
            line = self.lines.recv() => line,
        }
    }
}

/// Forwards lines from `reader` until end of input or until the receiver
/// goes away. Bytes that are not valid UTF-8 are replaced, not fatal.
fn forward_lines<R: BufRead>(mut reader: R, tx: mpsc::Sender<String>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']).to_string();
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "Failed to read from stdin");
                break;
            }
        }
    }
    trace!("stdin reader exited");
}

/// Cancels `interrupt` on the first Ctrl+C.
pub async fn watch_interrupt(interrupt: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => interrupt.cancel(),
        Err(e) => warn!(error = %e, "Unable to listen for Ctrl+C"),
    }
}
