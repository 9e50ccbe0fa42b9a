//! Session lifecycle with a statum state machine
//!
//! ```text
//! Configured ──► Streaming ──► (report | error)
//! ```
//!
//! `Configured` holds a validated setup and has not read a byte yet.
//! `Streaming` owns the blocking loop. Whatever ends the loop (stream close,
//! transport error, injector error or a stop request), the cleanup sweep runs
//! before `run` returns.

use crate::injector::KeyInjector;
use crate::input::{InputStateMachine, KeyEmitter, KeyState, Thresholds};
use crate::protocol::{FrameReader, SyncAttempt};
use crate::session::{SessionEnd, SessionError, SessionReport};
use crate::transport::ByteSource;
use chrono::{DateTime, Local};
use statum::{machine, state, transition};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Interval for throughput statistics in the log
const STATS_INTERVAL_SECS: i64 = 10;

pub type BoxedSource = Box<dyn ByteSource + Send>;
pub type BoxedInjector = Box<dyn KeyInjector + Send>;

#[state]
#[derive(Debug, Clone)]
pub enum SessionState {
    Configured, // Validated, nothing read yet
    Streaming,  // Running the read loop
}

#[machine]
pub struct Session<SessionState> {
    name: String,
    reader: FrameReader<BoxedSource>,
    machine: InputStateMachine,
    emitter: KeyEmitter<BoxedInjector>,
    started_at: DateTime<Local>,
    transitions: u64,
}

impl<S: SessionStateTrait> Session<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thresholds(&self) -> Thresholds {
        self.machine.thresholds()
    }

    /// Keys the injector currently holds
    pub fn held(&self) -> &KeyState {
        self.emitter.held()
    }
}

impl Session<Configured> {
    /// Builds a session around a byte source and an injector.
    ///
    /// Fails with [`SessionError::InvalidThresholds`] unless `low < high`.
    pub fn create(
        name: impl Into<String>,
        source: BoxedSource,
        injector: BoxedInjector,
        thresholds: Thresholds,
    ) -> Result<Self, SessionError> {
        let name = name.into();
        info!(
            "Creating session {} (dead zone {}, injector {})",
            name,
            thresholds,
            injector.name()
        );

        if !thresholds.is_valid() {
            error!("Rejecting thresholds {} for session {}", thresholds, name);
            return Err(SessionError::InvalidThresholds(thresholds));
        }

        Ok(Session::<Configured>::builder()
            .name(name)
            .reader(FrameReader::new(source))
            .machine(InputStateMachine::new(thresholds))
            .emitter(KeyEmitter::new(injector))
            .started_at(Local::now()) // reset by start()
            .transitions(0)
            .build())
    }
}

#[transition]
impl Session<Configured> {
    pub fn start(mut self) -> Session<Streaming> {
        self.started_at = Local::now();
        info!("Session {} streaming", self.name);
        self.transition()
    }
}

impl Session<Streaming> {
    /// Runs until the byte source closes or fails.
    pub fn run(self) -> Result<SessionReport, SessionError> {
        self.drive(None)
    }

    /// Runs until the byte source closes or fails, or `stop` turns true.
    ///
    /// The flag is checked between synchronization attempts, so a stop takes
    /// effect within two transport timeouts (sync byte plus payload).
    pub fn run_until_stopped(self, stop: watch::Receiver<bool>) -> Result<SessionReport, SessionError> {
        self.drive(Some(stop))
    }

    fn drive(mut self, stop: Option<watch::Receiver<bool>>) -> Result<SessionReport, SessionError> {
        let outcome = self.pump(stop.as_ref());

        // Must run on every exit path before control goes back to the caller
        let released = self.emitter.cleanup();

        match outcome {
            Ok(end) => {
                let stats = self.reader.stats();
                let report = SessionReport {
                    name: self.name.clone(),
                    started_at: self.started_at,
                    ended_at: Local::now(),
                    end,
                    frames: stats.frames,
                    skipped_bytes: stats.skipped_bytes,
                    short_frames: stats.short_frames,
                    idle_reads: stats.idle_reads,
                    transitions: self.transitions,
                    key_events: self.emitter.emitted(),
                    released_on_cleanup: released,
                };
                info!("Session finished: {}", report);
                Ok(report)
            }
            Err(e) => {
                error!(
                    "Session {} terminated with error after releasing {} key(s): {}",
                    self.name,
                    released.len(),
                    e
                );
                Err(e)
            }
        }
    }

    fn pump(&mut self, stop: Option<&watch::Receiver<bool>>) -> Result<SessionEnd, SessionError> {
        let mut frames_since_log = 0u64;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(STATS_INTERVAL_SECS);

        loop {
            if stop.is_some_and(|rx| *rx.borrow()) {
                info!("Stop requested for session {}", self.name);
                return Ok(SessionEnd::Stopped);
            }

            match self.reader.poll_frame()? {
                SyncAttempt::Frame(frame) => {
                    let transitions = self.machine.apply(frame.axis, frame.value);
                    self.transitions += transitions.len() as u64;
                    self.emitter.emit_all(&transitions)?;
                    frames_since_log += 1;
                }
                SyncAttempt::Closed => {
                    info!("Byte source of session {} closed", self.name);
                    return Ok(SessionEnd::StreamClosed);
                }
                SyncAttempt::Skipped(reason) => debug!("Sync attempt skipped: {:?}", reason),
                SyncAttempt::Idle => {}
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Session {} stats: {} frames in last {} seconds (avg {:.2}/sec), {} keys held",
                    self.name,
                    frames_since_log,
                    log_interval.num_seconds(),
                    frames_since_log as f64 / log_interval.num_seconds() as f64,
                    self.emitter.held().held_keys().len()
                );
                frames_since_log = 0;
                last_log_time = now;
            }
        }
    }
}
