//! Structured event stream for `cvpipeline`.
//!
//! Discrete, typed session events serialized as newline-delimited JSON
//! (JSONL) with a monotonically increasing sequence number and the
//! session id.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::phase::{Command, Phase};

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a narrative session.
///
/// Each variant is tagged with `"type"` when serialized to JSON so consumers
/// can dispatch on the event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A session started.
    SessionStarted {
        /// When the session started.
        timestamp: DateTime<Utc>,
        /// Application version shown in the header.
        version: String,
        /// Playback speed multiplier.
        speed: f64,
    },

    /// A phase was entered.
    PhaseEntered {
        /// When the transition occurred.
        timestamp: DateTime<Utc>,
        /// Phase left.
        from: Phase,
        /// Phase entered.
        to: Phase,
        /// `"user"`, `"skip"` or `"autorun"`.
        reason: String,
        /// Epoch of the new entry.
        epoch: u64,
    },

    /// A user command was issued.
    CommandIssued {
        /// When the command was issued.
        timestamp: DateTime<Utc>,
        /// The command.
        command: Command,
        /// Whether its guard accepted it.
        accepted: bool,
    },

    /// Analytics was bootstrapped.
    AnalyticsBootstrapped {
        /// When the bootstrap ran.
        timestamp: DateTime<Utc>,
        /// Tag-manager container id.
        container_id: String,
        /// Script URL that would be loaded.
        script_url: String,
        /// Initial data-layer push.
        data_layer: serde_json::Value,
    },

    /// The page-view counter answered.
    VisitsLoaded {
        /// When the count arrived.
        timestamp: DateTime<Utc>,
        /// Total page views.
        count: u64,
    },

    /// The session ended.
    SessionEnded {
        /// When the session ended.
        timestamp: DateTime<Utc>,
        /// Phase at the end.
        phase: Phase,
        /// Human-readable reason.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number and session via serde flatten)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    session: Uuid,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) atomically increments the sequence
/// counter, serializes the event as a single JSON line, and flushes the
/// underlying writer.  Serialization or I/O failures are dropped; an event
/// stream never ends a session.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
    session: Uuid,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("session", &self.session)
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
            session: Uuid::new_v4(),
        }
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            session: self.session,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Session id stamped on every event.
    #[must_use]
    pub const fn session(&self) -> Uuid {
        self.session
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
