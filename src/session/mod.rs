//! Session subsystem: one connection, one loop, one key state
//!
//! 1. [`runner`] - The blocking read-decode-apply-emit loop with its lifecycle
//! 2. [`session_handle`] - Runs a session on the tokio blocking pool and stops it on request
//!
//! # Architecture
//!
//! ```text
//! ByteSource ──► FrameReader ──► InputStateMachine ──► KeyEmitter ──► KeyInjector
//!                                                          │
//!                                         cleanup sweep on every exit path
//! ```
//!
//! Sessions share nothing. Each one owns its source, its injector and both key
//! state records.

pub mod runner;
pub mod session_handle;

pub use runner::{Configured, Session, SessionState, SessionStateTrait, Streaming};
pub use session_handle::{SessionHandle, SessionStopper};

use crate::injector::InjectorError;
use crate::input::{LogicalKey, Thresholds};
use crate::transport::TransportError;
use chrono::{DateTime, Local};
use std::fmt;

/// Errors that end a session. The cleanup sweep has already run when a caller sees one.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Key injection error: {0}")]
    Injector(#[from] InjectorError),

    #[error("Invalid thresholds {0}: low must be below high")]
    InvalidThresholds(Thresholds),

    #[error("Session task error: {0}")]
    TaskError(String),
}

/// How a session came to an end without an error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The byte source was closed
    StreamClosed,
    /// A stop request arrived from outside
    Stopped,
}

/// Summary handed back after a session finished cleanly
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub name: String,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub end: SessionEnd,
    pub frames: u64,
    pub skipped_bytes: u64,
    pub short_frames: u64,
    pub idle_reads: u64,
    /// Transitions requested by the state machine
    pub transitions: u64,
    /// Press and release calls that reached the injector, cleanup included
    pub key_events: u64,
    /// Keys the cleanup sweep had to release
    pub released_on_cleanup: Vec<LogicalKey>,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duration = self.ended_at - self.started_at;
        write!(
            f,
            "{}: {:?} after {}.{:03}s, {} frames, {} skipped bytes, {} short frames, {} transitions, {} key events, {} released on cleanup",
            self.name,
            self.end,
            duration.num_seconds(),
            duration.num_milliseconds() % 1000,
            self.frames,
            self.skipped_bytes,
            self.short_frames,
            self.transitions,
            self.key_events,
            self.released_on_cleanup.len()
        )
    }
}
