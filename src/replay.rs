//! Replay of recorded channel updates.
//!
//! Updates are read as JSON lines on a background thread and handed to the
//! processing loop over a bounded channel. All device state is mutated on the
//! processing side only.

use crate::activity::SharedActivityLog;
use crate::channel::ChannelUpdate;
use crate::core::{ApplyResult, DeviceSet};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::thread::JoinHandle;

/// Where updates are read from.
#[derive(Debug, Clone)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) if p.as_os_str() != "-" => InputSource::File(p),
            _ => InputSource::Stdin,
        }
    }
}

/// Something read from the input.
#[derive(Debug, Clone)]
pub enum ReplayEvent {
    Update(ChannelUpdate),
    Malformed { line: usize, message: String },
}

/// Errors that can occur while replaying.
#[derive(Debug)]
pub enum ReplayError {
    Io(String),
    Parse { line: usize, message: String },
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::Io(e) => write!(f, "IO error: {e}"),
            ReplayError::Parse { line, message } => write!(f, "line {line}: {message}"),
        }
    }
}

impl std::error::Error for ReplayError {}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<ChannelUpdate>, ReplayError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| ReplayError::Parse {
            line: line_no,
            message: e.to_string(),
        })
}

/// Read every line from `reader` and forward it to `sender`.
///
/// Lines that are not valid UTF-8 are reported as malformed like any other
/// unparseable line. Stops early if the receiving side hangs up.
pub fn forward_updates<R: BufRead>(
    mut reader: R,
    sender: &Sender<ReplayEvent>,
) -> Result<(), ReplayError> {
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| ReplayError::Io(e.to_string()))?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let event = match std::str::from_utf8(&buf) {
            Ok(line) => match parse_line(line, line_no) {
                Ok(Some(update)) => ReplayEvent::Update(update),
                Ok(None) => continue,
                Err(ReplayError::Parse { line, message }) => {
                    ReplayEvent::Malformed { line, message }
                }
                Err(e) => return Err(e),
            },
            Err(e) => ReplayEvent::Malformed {
                line: line_no,
                message: format!("invalid UTF-8: {e}"),
            },
        };
        if sender.send(event).is_err() {
            break;
        }
    }
    Ok(())
}

/// Background reader feeding updates into a bounded channel.
pub struct UpdateReader {
    receiver: Receiver<ReplayEvent>,
    handle: Option<JoinHandle<Result<(), ReplayError>>>,
}

impl UpdateReader {
    /// Start reading from `source` on a new thread.
    pub fn spawn(source: InputSource, capacity: usize) -> Result<Self, ReplayError> {
        let (sender, receiver) = bounded(capacity.max(1));

        let handle = match source {
            InputSource::File(path) => {
                let file = std::fs::File::open(&path)
                    .map_err(|e| ReplayError::Io(format!("{}: {e}", path.display())))?;
                std::thread::spawn(move || forward_updates(BufReader::new(file), &sender))
            }
            InputSource::Stdin => std::thread::spawn(move || {
                let stdin = std::io::stdin();
                forward_updates(stdin.lock(), &sender)
            }),
        };

        Ok(Self {
            receiver,
            handle: Some(handle),
        })
    }

    /// Get the receiver for replay events.
    pub fn receiver(&self) -> &Receiver<ReplayEvent> {
        &self.receiver
    }

    /// Wait for the reader thread and return its result.
    pub fn join(mut self) -> Result<(), ReplayError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReplayError::Io("reader thread panicked".to_string()))?,
            None => Ok(()),
        }
    }
}

/// Applies replay events to a device set and records what happened.
pub struct Replayer {
    devices: DeviceSet,
    log: SharedActivityLog,
}

impl Replayer {
    pub fn new(log: SharedActivityLog) -> Self {
        Self {
            devices: DeviceSet::new(),
            log,
        }
    }

    /// Handle a single event.
    pub fn handle(&mut self, event: ReplayEvent) -> Option<ApplyResult> {
        match event {
            ReplayEvent::Update(update) => {
                self.log.record_update();
                let result = self.devices.apply(&update);
                self.log.record_apply(result);
                Some(result)
            }
            ReplayEvent::Malformed { line, message } => {
                tracing::warn!(line, "Skipping malformed update: {}", message);
                self.log.record_malformed_line();
                None
            }
        }
    }

    /// Drain every event from `receiver` until the sender hangs up.
    pub fn run_to_end(&mut self, receiver: &Receiver<ReplayEvent>) {
        for event in receiver.iter() {
            self.handle(event);
        }
    }

    pub fn devices(&self) -> &DeviceSet {
        &self.devices
    }

    pub fn log(&self) -> &SharedActivityLog {
        &self.log
    }
}
