use crate::injector::{InjectorError, KeyInjector};
use crate::input::LogicalKey;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// One call received by a [`RecordingInjector`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InjectorCall {
    Press(LogicalKey),
    Release(LogicalKey),
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<InjectorCall>,
    failing: HashSet<InjectorCall>,
}

/// Injector that records every call instead of touching the OS.
///
/// Clones share the same recording, so a test can keep one clone while the
/// session owns another. Calls registered with [`fail_on`](Self::fail_on) are
/// recorded and then answered with an error.
#[derive(Clone, Debug, Default)]
pub struct RecordingInjector {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future occurrence of `call` fail
    pub fn fail_on(&self, call: InjectorCall) {
        self.lock().failing.insert(call);
    }

    pub fn calls(&self) -> Vec<InjectorCall> {
        self.lock().calls.clone()
    }

    pub fn presses(&self, key: LogicalKey) -> usize {
        self.count(InjectorCall::Press(key))
    }

    pub fn releases(&self, key: LogicalKey) -> usize {
        self.count(InjectorCall::Release(key))
    }

    /// Keys whose last recorded call was a press
    pub fn currently_down(&self) -> Vec<LogicalKey> {
        let calls = self.calls();
        LogicalKey::ALL
            .into_iter()
            .filter(|key| {
                calls.iter().rev().find_map(|call| match call {
                    InjectorCall::Press(k) if k == key => Some(true),
                    InjectorCall::Release(k) if k == key => Some(false),
                    _ => None,
                }) == Some(true)
            })
            .collect()
    }

    fn count(&self, call: InjectorCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: InjectorCall) -> bool {
        let mut recording = self.lock();
        recording.calls.push(call);
        !recording.failing.contains(&call)
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        // A panicking test thread must not hide the calls recorded so far
        self.recording
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyInjector for RecordingInjector {
    fn press(&mut self, key: LogicalKey) -> Result<(), InjectorError> {
        if self.record(InjectorCall::Press(key)) {
            Ok(())
        } else {
            Err(InjectorError::PressFailed {
                key,
                reason: "scripted failure".to_string(),
            })
        }
    }

    fn release(&mut self, key: LogicalKey) -> Result<(), InjectorError> {
        if self.record(InjectorCall::Release(key)) {
            Ok(())
        } else {
            Err(InjectorError::ReleaseFailed {
                key,
                reason: "scripted failure".to_string(),
            })
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}
