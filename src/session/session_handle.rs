use crate::session::{Configured, Session, SessionError, SessionReport};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Requests a running session to stop. Cheap to clone and hand to signal handlers.
#[derive(Clone, Debug)]
pub struct SessionStopper {
    stop_tx: Arc<watch::Sender<bool>>,
}

impl SessionStopper {
    pub fn stop(&self) {
        debug!("Sending stop signal to session");
        self.stop_tx.send_replace(true);
    }
}

/// Handle for a session running on the tokio blocking pool
///
/// The read loop blocks inside the transport, so it gets its own blocking
/// thread instead of an async task.
#[derive(Debug)]
pub struct SessionHandle {
    name: String,
    stop_tx: Arc<watch::Sender<bool>>,
    task_handle: Option<JoinHandle<Result<SessionReport, SessionError>>>,
}

impl SessionHandle {
    /// Starts the session and returns immediately. Must be called inside a tokio runtime.
    pub fn spawn(session: Session<Configured>) -> Self {
        let name = session.name().to_string();
        let (stop_tx, stop_rx) = watch::channel(false);

        info!("Spawning session: {}", name);
        let streaming = session.start();
        let task_handle = tokio::task::spawn_blocking(move || streaming.run_until_stopped(stop_rx));

        Self {
            name,
            stop_tx: Arc::new(stop_tx),
            task_handle: Some(task_handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stopper(&self) -> SessionStopper {
        SessionStopper {
            stop_tx: self.stop_tx.clone(),
        }
    }

    /// Asks the session to stop after its current synchronization attempt
    pub fn stop(&self) {
        info!("Stopping session: {}", self.name);
        self.stop_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task_handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Waits for the session to end and returns its report.
    pub async fn wait(&mut self) -> Result<SessionReport, SessionError> {
        let Some(handle) = self.task_handle.take() else {
            warn!("Session already joined: {}", self.name);
            return Err(SessionError::TaskError(format!(
                "session {} already joined",
                self.name
            )));
        };

        match handle.await {
            Ok(result) => {
                debug!("Session task completed: {}", self.name);
                result
            }
            Err(e) => {
                error!("Session task panicked: {} - {}", self.name, e);
                Err(SessionError::TaskError(format!(
                    "session {} panicked: {}",
                    self.name, e
                )))
            }
        }
    }

    /// Stops the session and waits for it
    pub async fn shutdown(mut self) -> Result<SessionReport, SessionError> {
        self.stop();
        self.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injector::RecordingInjector;
    use crate::input::{LogicalKey, Thresholds};
    use crate::session::SessionEnd;
    use crate::transport::ReadSource;
    use std::io::{Cursor, ErrorKind, Read};

    /// Never delivers a byte, like a quiet serial line
    struct Silent;

    impl Read for Silent {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            std::thread::sleep(std::time::Duration::from_millis(5));
            Err(ErrorKind::TimedOut.into())
        }
    }

    #[tokio::test]
    async fn test_wait_returns_report() {
        let recorder = RecordingInjector::new();
        let session = Session::create(
            "cursor",
            Box::new(ReadSource::new(Cursor::new(vec![0xFF, 2, 1, 0]))),
            Box::new(recorder.clone()),
            Thresholds::default(),
        )
        .unwrap();

        let mut handle = SessionHandle::spawn(session);
        let report = handle.wait().await.unwrap();

        assert_eq!(report.end, SessionEnd::StreamClosed);
        assert_eq!(recorder.presses(LogicalKey::ActionR), 1);
        assert_eq!(recorder.releases(LogicalKey::ActionR), 1);
        assert!(handle.wait().await.is_err());
    }

    #[tokio::test]
    async fn test_stopper_ends_quiet_session() {
        let session = Session::create(
            "silent",
            Box::new(ReadSource::new(Silent)),
            Box::new(RecordingInjector::new()),
            Thresholds::default(),
        )
        .unwrap();

        let mut handle = SessionHandle::spawn(session);
        let stopper = handle.stopper();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        stopper.stop();
        let report = handle.wait().await.unwrap();
        assert_eq!(report.end, SessionEnd::Stopped);
        assert!(report.idle_reads > 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_and_joins() {
        let recorder = RecordingInjector::new();
        let session = Session::create(
            "quiet-line",
            Box::new(ReadSource::new(Silent)),
            Box::new(recorder.clone()),
            Thresholds::default(),
        )
        .unwrap();

        let handle = SessionHandle::spawn(session);
        assert_eq!(handle.name(), "quiet-line");

        let report = handle.shutdown().await.unwrap();
        assert_eq!(report.name, "quiet-line");
        assert_eq!(report.end, SessionEnd::Stopped);
        assert!(recorder.calls().is_empty());
    }
}
