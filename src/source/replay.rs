//! JSON-lines replay source.
//!
//! Reads one [`SensorReading`] per line from any buffered reader (a recorded
//! session file or stdin) on a background thread and forwards it through a
//! bounded channel. Malformed lines are counted and skipped.

use crate::source::types::SensorReading;
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Channel capacity between the reader thread and the consumer.
const CHANNEL_CAPACITY: usize = 10_000;

/// How long a blocked send waits before re-checking the running flag.
const SEND_POLL: Duration = Duration::from_millis(100);

/// Errors from the replay source.
#[derive(Debug)]
pub enum SourceError {
    AlreadyRunning,
    AlreadyConsumed,
    IoError(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::AlreadyRunning => write!(f, "Replay source is already running"),
            SourceError::AlreadyConsumed => write!(f, "Replay input was already consumed"),
            SourceError::IoError(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Streams readings from a JSON-lines input.
pub struct ReplaySource {
    input: Option<Box<dyn BufRead + Send>>,
    sender: Option<Sender<SensorReading>>,
    receiver: Receiver<SensorReading>,
    running: Arc<AtomicBool>,
    malformed: Arc<AtomicU64>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ReplaySource {
    /// Create a source over any buffered reader.
    pub fn new<R: BufRead + Send + 'static>(input: R) -> Self {
        let (sender, receiver) = bounded(CHANNEL_CAPACITY);
        Self {
            input: Some(Box::new(input)),
            sender: Some(sender),
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            malformed: Arc::new(AtomicU64::new(0)),
            thread_handle: None,
        }
    }

    /// Open a recorded session file.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)
            .map_err(|e| SourceError::IoError(format!("{}: {e}", path.display())))?;
        Ok(Self::new(BufReader::new(file)))
    }

    /// Read from standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()))
    }

    /// Start reading in a background thread.
    ///
    /// The channel disconnects once the input is exhausted or the source is
    /// stopped.
    pub fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }
        let (input, sender) = match (self.input.take(), self.sender.take()) {
            (Some(input), Some(sender)) => (input, sender),
            _ => return Err(SourceError::AlreadyConsumed),
        };

        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let malformed = self.malformed.clone();

        let handle = thread::spawn(move || {
            read_lines(input, sender, &running, &malformed);
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop reading.
    ///
    /// A reader blocked on input (an idle stdin) is detached rather than
    /// joined; it exits after its next line.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for readings.
    pub fn receiver(&self) -> &Receiver<SensorReading> {
        &self.receiver
    }

    /// Try to receive a reading without blocking.
    pub fn try_recv(&self) -> Option<SensorReading> {
        self.receiver.try_recv().ok()
    }

    /// Number of lines that could not be parsed.
    pub fn malformed_lines(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_lines(
    input: Box<dyn BufRead + Send>,
    sender: Sender<SensorReading>,
    running: &AtomicBool,
    malformed: &AtomicU64,
) {
    for (index, line) in input.lines().enumerate() {
        if !running.load(Ordering::SeqCst) {
            return;
        }

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "stopping replay on read error");
                return;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let reading: SensorReading = match serde_json::from_str(trimmed) {
            Ok(reading) => reading,
            Err(e) => {
                malformed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(line = index + 1, error = %e, "skipping malformed line");
                continue;
            }
        };

        let mut pending = reading;
        loop {
            match sender.send_timeout(pending, SEND_POLL) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(back)) => {
                    if !running.load(Ordering::SeqCst) {
                        return;
                    }
                    pending = back;
                }
                Err(SendTimeoutError::Disconnected(_)) => return,
            }
        }
    }
}
